//! Serde model of Lottie (bodymovin) JSON documents.

pub mod model;

pub use model::LottieJson;
