// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod action;
pub mod controller;
pub mod error;
pub mod ids;
pub mod model;
pub mod pagination;
pub mod resource;
pub mod rules;
pub mod search;
pub mod settings;
pub mod state;
pub mod summary;
pub mod transport;
pub mod validation;

pub use action::*;
pub use controller::*;
pub use error::*;
pub use ids::*;
pub use model::*;
pub use resource::*;
pub use settings::*;
pub use state::*;
pub use summary::*;
pub use transport::*;
pub use validation::*;
