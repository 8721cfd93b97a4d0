//! Translation of a Lottie document into a [`CompositionGraph`].
//!
//! A [`Translator`] is created per document and discarded afterwards. It
//! owns the output graph, the recorded issues and the caches of shared
//! objects (easings, static brushes, progress bindings), so concurrent
//! translations never share state.

mod binder;
mod brushes;
mod context;
mod layers;
mod shapes;
mod transforms;

use std::collections::HashMap;
use std::time::Duration;

use lottie_data::model::LottieJson;
use tracing::{debug, info};

pub use context::{
    compose_opacity_percents, RoundedCorner, ShapeContentContext, SolidFill, SolidStroke,
    TranslationContext, TrimPath,
};

use crate::error::TranslateError;
use crate::graph::{Color8, CompositionGraph, CompositionObject, NodeId};
use crate::issues::Issues;
use crate::{TranslateOptions, Translation};

/// Name of the root scalar property that drives every animation.
pub const PROGRESS_PROPERTY: &str = "Progress";

/// Expression parameter name bound to the root visual.
const ROOT_NAME: &str = "_";

/// Gap between a keyframe and the step that freezes it.
const EPSILON: f64 = 0.0000001;

pub struct Translator<'a> {
    document: &'a LottieJson,
    graph: CompositionGraph,
    root: NodeId,
    issues: Issues,
    annotate: bool,
    duration: Duration,
    linear_easing: Option<NodeId>,
    hold_easing: Option<NodeId>,
    jump_easing: Option<NodeId>,
    cubic_easings: HashMap<[(u32, u32); 2], NodeId>,
    color_brushes: HashMap<Color8, NodeId>,
    progress_bindings: HashMap<(u64, u64), NodeId>,
    t_counter: u32,
}

impl<'a> Translator<'a> {
    pub fn new(document: &'a LottieJson, options: &TranslateOptions) -> Self {
        let mut graph = CompositionGraph::new();
        let root = graph.add(CompositionObject::container_visual());
        graph.insert_scalar(root, PROGRESS_PROPERTY, 0.0);
        if options.annotate {
            graph.set_comment(root, "Lottie");
        }

        let duration = if document.fr > 0.0 {
            Duration::from_secs_f64(document.duration_in_frames().max(0.0) as f64 / document.fr as f64)
        } else {
            Duration::ZERO
        };

        Self {
            document,
            graph,
            root,
            issues: Issues::new(options.strict),
            annotate: options.annotate,
            duration,
            linear_easing: None,
            hold_easing: None,
            jump_easing: None,
            cubic_easings: HashMap::new(),
            color_brushes: HashMap::new(),
            progress_bindings: HashMap::new(),
            t_counter: 0,
        }
    }

    pub fn translate(mut self) -> Result<Translation, TranslateError> {
        let document = self.document;
        debug!(
            name = document.nm.as_deref().unwrap_or(""),
            layers = document.layers.len(),
            "translating composition"
        );

        if document.is_3d() {
            self.issues.unsupported("3d composition")?;
        }

        let context = TranslationContext::root(document);
        if context.duration_in_frames <= 0.0 {
            return Err(TranslateError::Invariant(format!(
                "composition has no duration (ip {}, op {})",
                document.ip, document.op
            )));
        }
        let root = self.root;
        self.translate_layers(&context, root)?;

        info!(
            nodes = self.graph.len(),
            issues = self.issues.len(),
            "translated composition"
        );

        Ok(Translation {
            graph: self.graph,
            root: self.root,
            width: document.w as f32,
            height: document.h as f32,
            duration: self.duration,
            progress_property: PROGRESS_PROPERTY,
            issues: self.issues.into_vec(),
        })
    }

    /// Attaches a debug comment when annotating.
    fn describe(&mut self, id: NodeId, comment: impl FnOnce() -> String) {
        if self.annotate {
            self.graph.set_comment(id, comment());
        }
    }

    /// Like [`Self::describe`], but keeps an existing comment in front.
    fn describe_appended(&mut self, id: NodeId, comment: impl FnOnce() -> String) {
        if !self.annotate {
            return;
        }
        let comment = match self.graph.comment(id) {
            Some(existing) => format!("{existing} & {}", comment()),
            None => comment(),
        };
        self.graph.set_comment(id, comment);
    }

    fn root_progress(&self) -> crate::expressions::Expression {
        crate::expressions::Expression::name(format!("{ROOT_NAME}.{PROGRESS_PROPERTY}"))
    }
}
