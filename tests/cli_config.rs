//! Configuration files and the `lottiegen` binary.
//!
//! Run with: cargo test --test cli_config

use std::path::Path;
use std::process::Command;

use lottie_compiler::{compile, CompilerConfig, Target};
use serde_json::json;
use tempfile::TempDir;

fn bouncing_ball() -> String {
    json!({
        "v": "5.5.0",
        "fr": 30,
        "ip": 0,
        "op": 60,
        "w": 300,
        "h": 300,
        "nm": "Bouncing Ball",
        "ddd": 0,
        "layers": [{
            "ty": 4,
            "ind": 1,
            "ip": 0,
            "op": 60,
            "st": 0,
            "nm": "Ball",
            "ks": {
                "p": { "a": 1, "k": [
                    { "t": 0, "s": [150, 50, 0] },
                    { "t": 30, "s": [150, 250, 0] },
                    { "t": 60, "s": [150, 50, 0] }
                ] }
            },
            "shapes": [
                { "ty": "el", "p": { "a": 0, "k": [0, 0] }, "s": { "a": 0, "k": [40, 40] } },
                { "ty": "fl", "c": { "a": 0, "k": [1, 0.5, 0, 1] }, "o": { "a": 0, "k": 100 } },
                { "ty": "gf", "nm": "Shine" }
            ]
        }],
        "assets": []
    })
    .to_string()
}

fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write test file");
    path
}

fn lottiegen(args: &[&str], cwd: &Path) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_lottiegen"))
        .args(args)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run lottiegen")
}

mod config_file {
    use super::*;

    #[test]
    fn test_config_file_supplies_settings() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "lottiegen.json",
            r#"{ "target": "cx", "annotate": true, "class_name": "Ball" }"#,
        );

        let config = CompilerConfig::load(&path).unwrap();
        assert_eq!(config.target, Target::Cx);
        assert!(config.annotate);
        assert_eq!(config.class_name_for(Path::new("bouncing_ball.json")), "Ball");

        let output = compile(&bouncing_ball(), &config, "Ball").unwrap();
        let code = output.code.expect("no code generated");
        assert_eq!(code.file_name, "Ball.cpp");
        assert!(code.text.contains("class Ball sealed"));
        assert!(code.text.contains("result->Comment = L\"Lottie\";"));
    }

    #[test]
    fn test_missing_config_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let error = CompilerConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(error.to_string().contains("absent.json"), "{error}");
    }

    #[test]
    fn test_malformed_config_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.json", r#"{ "target": "java" }"#);
        assert!(CompilerConfig::load(&path).is_err());
    }
}

mod binary {
    use super::*;

    #[test]
    fn test_writes_class_to_output_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "bouncing_ball.json", &bouncing_ball());

        let result = lottiegen(&["bouncing_ball.json", "--output", "out.cs"], dir.path());
        assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

        let text = std::fs::read_to_string(dir.path().join("out.cs")).unwrap();
        assert!(text.contains("sealed class BouncingBall : Host.ICompositionSource"));
        assert!(text.contains("Vector2KeyFrameAnimation"));
        assert!(result.stdout.is_empty());

        let stderr = String::from_utf8_lossy(&result.stderr);
        assert!(stderr.lines().any(|line| line == "Gradient fill"), "{stderr}");
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ball.json", &bouncing_ball());
        write_file(&dir, "config.json", r#"{ "target": "cx", "class_name": "FromFile" }"#);

        let result = lottiegen(
            &["ball.json", "--config", "config.json", "--target", "cs", "--class-name", "FromFlag"],
            dir.path(),
        );
        assert!(result.status.success(), "{}", String::from_utf8_lossy(&result.stderr));

        let stdout = String::from_utf8_lossy(&result.stdout);
        assert!(stdout.contains("sealed class FromFlag : Host.ICompositionSource"));
    }

    #[test]
    fn test_issues_target_prints_no_code() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ball.json", &bouncing_ball());

        let result = lottiegen(&["ball.json", "--target", "issues"], dir.path());
        assert!(result.status.success());
        assert!(result.stdout.is_empty());
        assert!(String::from_utf8_lossy(&result.stderr).contains("Gradient fill"));
    }

    #[test]
    fn test_strict_mode_exits_with_failure() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "ball.json", &bouncing_ball());

        let result = lottiegen(&["ball.json", "--strict"], dir.path());
        assert!(!result.status.success());
        assert!(result.stdout.is_empty());
        assert!(String::from_utf8_lossy(&result.stderr).contains("Gradient fill"));
    }

    #[test]
    fn test_missing_input_exits_with_failure() {
        let dir = TempDir::new().unwrap();
        let result = lottiegen(&["nowhere.json"], dir.path());
        assert!(!result.status.success());
        assert!(String::from_utf8_lossy(&result.stderr).contains("nowhere.json"));
    }
}
