// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod categorize;
pub mod content;
pub mod display;
pub mod favorites;
pub mod model;
pub mod search;
pub mod state;

pub use categorize::*;
pub use content::*;
pub use display::*;
pub use favorites::*;
pub use model::*;
pub use search::*;
pub use state::*;
