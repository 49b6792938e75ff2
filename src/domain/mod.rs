// Domain layer - Typed data, scales and scene elements
pub mod error;
pub mod record;
pub mod scale;
pub mod scene;
pub mod series;
