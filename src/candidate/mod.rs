//! Candidate selection and pruning utilities.
//!
//! Includes Top-K collection, spatial non-maximum suppression and the
//! small-window maximum search used to combine two responses.

pub(crate) mod nms;
pub(crate) mod topk;
pub(crate) mod window;
