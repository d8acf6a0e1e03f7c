//! Page objects for each screen of the login flows.

pub mod auth;
pub mod email_verification;
pub mod github;
pub mod google;
pub mod sso;

pub use auth::AuthPage;
pub use email_verification::EmailVerificationPage;
pub use github::GitHubLoginPage;
pub use google::GoogleLoginPage;
pub use sso::SsoLoginPage;
