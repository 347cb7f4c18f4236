// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod dispatch;
pub mod forms;
pub mod listing;
pub mod model;
pub mod notify;
pub mod state;
pub mod validation;

pub use dispatch::*;
pub use forms::*;
pub use listing::*;
pub use model::*;
pub use notify::*;
pub use state::*;
pub use validation::*;
