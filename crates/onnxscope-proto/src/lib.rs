//! ONNX protobuf messages.
//!
//! Hand-maintained prost definitions for the subset of `onnx.proto` that
//! model inspection and dim rewriting touch. Field tags match the upstream
//! schema, so any conforming `.onnx` file decodes; fields not listed here are
//! skipped on decode and therefore not preserved on re-encode.

pub mod onnx;
