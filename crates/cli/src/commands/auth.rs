//! Account commands.

use clap::Subcommand;
use lumina_storefront::auth::{ProfileForm, SignInForm, SignUpForm};
use lumina_storefront::error::AppError;
use lumina_storefront::state::Storefront;
use secrecy::SecretString;
use tracing::info;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in with email and password
    SignIn {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    /// Create an account
    SignUp {
        #[arg(short, long)]
        fullname: String,
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
        /// Repeat the password
        #[arg(long)]
        confirm: String,
    },
    /// Sign out
    SignOut,
    /// Email a password reset link
    ResetPassword { email: String },
    /// Show the signed-in profile
    Whoami {
        /// Re-read the profile from the provider first
        #[arg(long)]
        refresh: bool,
    },
    /// Edit the signed-in profile (omitted fields keep their values)
    UpdateProfile {
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        /// Avatar image reference
        #[arg(long)]
        avatar: Option<String>,
        /// Banner image reference
        #[arg(long)]
        banner: Option<String>,
    },
}

/// Run an `auth` subcommand.
///
/// # Errors
///
/// Returns the auth error; its message is also kept in the session state.
pub async fn run(shop: &mut Storefront, action: AuthAction) -> Result<(), AppError> {
    match action {
        AuthAction::SignIn { email, password } => {
            let form = SignInForm {
                email,
                password: SecretString::from(password),
            };
            let user = shop.auth.sign_in(&form).await?;
            info!("Welcome back, {}", user.fullname);
        }
        AuthAction::SignUp {
            fullname,
            email,
            password,
            confirm,
        } => {
            let form = SignUpForm {
                fullname,
                email,
                password: SecretString::from(password),
                confirm_password: SecretString::from(confirm),
            };
            let user = shop.auth.sign_up(&form).await?;
            info!("Account created for {}", user.email);
        }
        AuthAction::SignOut => {
            shop.auth.sign_out().await?;
            info!("Signed out");
        }
        AuthAction::ResetPassword { email } => {
            shop.auth.reset_password(&email).await?;
            info!("If an account exists for {email}, a reset link is on its way");
        }
        AuthAction::Whoami { refresh } => {
            if refresh {
                shop.auth.refresh().await?;
            }
            match shop.auth.user() {
                Some(user) => {
                    info!("{} <{}> ({})", user.fullname, user.email, user.role);
                    if let Some(address) = &user.address {
                        info!("  Address: {}", address.address);
                    }
                    if let Some(mobile) = &user.mobile {
                        info!("  Mobile: {} {}", mobile.dial_code, mobile.value);
                    }
                    info!("  Joined: {}", user.date_joined.format("%Y-%m-%d"));
                }
                None => info!("Not signed in"),
            }
        }
        AuthAction::UpdateProfile {
            fullname,
            email,
            address,
            mobile,
            avatar,
            banner,
        } => {
            let Some(current) = shop.auth.user() else {
                return Err(AppError::Unauthorized("sign in required".to_string()));
            };
            let prefill = ProfileForm::from_user(current);
            let form = ProfileForm {
                fullname: fullname.unwrap_or(prefill.fullname),
                email: email.unwrap_or(prefill.email),
                address: address.unwrap_or(prefill.address),
                mobile: mobile.unwrap_or(prefill.mobile),
                avatar,
                banner,
            };
            let config = shop.config().checkout.clone();
            let user = shop.auth.update_profile(&form, &config).await?;
            info!("Profile updated for {}", user.fullname);
        }
    }
    Ok(())
}
