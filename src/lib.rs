//! georelay forwards captured map screenshots to an external object-detection
//! API, persists the annotated image it gets back, and answers with a
//! normalized JSON payload (artifact URL + detection list) that the map UI
//! renders.

pub mod detector;
pub mod error;
pub mod normalize;
pub mod server;
pub mod settings;
pub mod store;
