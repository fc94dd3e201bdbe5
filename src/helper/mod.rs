pub mod auth_helpers;
pub mod directory_helpers;
pub mod form_helpers;
pub mod token_helpers;
pub mod view_helpers;
pub mod workflow_helpers;
