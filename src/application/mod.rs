pub mod use_cases;

pub use use_cases::auth_service::AuthService;
pub use use_cases::collection_service::CollectionService;
pub use use_cases::ui_state::UiStateService;
