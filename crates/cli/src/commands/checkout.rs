//! Checkout commands.
//!
//! Each step is checked against the route guard first, so a signed-out
//! shopper is told to sign in before any cart check runs.

use clap::Subcommand;
use lumina_storefront::checkout::{
    CheckoutStep, PaymentForm, PaymentMethod, ShippingForm, StepGate, Totals,
};
use lumina_storefront::error::AppError;
use lumina_storefront::navigation::GuardDecision;
use lumina_storefront::state::Storefront;
use tracing::{info, warn};

use super::cart_line;

#[derive(Subcommand)]
pub enum CheckoutAction {
    /// Step 1: review the cart
    Review,
    /// Step 2: shipping details (blank fields fall back to saved details)
    Shipping {
        #[arg(long)]
        fullname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        mobile: Option<String>,
        /// Ship outside the home country (adds a surcharge)
        #[arg(long)]
        international: bool,
    },
    /// Step 3: payment, then place the order
    Payment {
        /// `credit-card` or `paypal`
        #[arg(long, default_value = "credit-card")]
        method: PaymentMethod,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        card_number: Option<String>,
        #[arg(long)]
        expiry: Option<String>,
        #[arg(long)]
        ccv: Option<String>,
    },
    /// Where the shopper is in checkout
    Status,
    /// Forget shipping and payment details
    Reset,
}

fn log_totals(totals: &Totals) {
    info!("Subtotal: {}", totals.subtotal);
    info!("Shipping: {}", totals.shipping_fee);
    info!("Total:    {}", totals.grand_total);
}

/// Check access and step preconditions; `false` means stop here.
fn enter(shop: &Storefront, step: CheckoutStep) -> Result<bool, AppError> {
    match shop.enter_checkout(step) {
        Ok(StepGate::Ready) => Ok(true),
        Ok(StepGate::EmptyCart) => Err(AppError::EmptyCart),
        Ok(StepGate::Redirect(to)) => {
            warn!("Complete {} first", to.route());
            Ok(false)
        }
        Err(GuardDecision::Redirect(route)) => {
            warn!("Please sign in first ({route})");
            Ok(false)
        }
        Err(GuardDecision::Pending | GuardDecision::Allow) => Ok(false),
    }
}

/// Run a `checkout` subcommand.
///
/// # Errors
///
/// Returns `EmptyCart`, `MissingShipping` or `Validation` when a step's
/// preconditions or form checks fail.
pub fn run(shop: &mut Storefront, action: CheckoutAction) -> Result<(), AppError> {
    match action {
        CheckoutAction::Review => {
            if !enter(shop, CheckoutStep::Review)? {
                return Ok(());
            }
            let totals = shop.checkout.review(&shop.cart)?;
            for line in shop.cart.lines() {
                info!("{}", cart_line(line));
            }
            log_totals(&totals);
        }
        CheckoutAction::Shipping {
            fullname,
            email,
            address,
            mobile,
            international,
        } => {
            if !enter(shop, CheckoutStep::Shipping)? {
                return Ok(());
            }
            let prefill = shop.shipping_form();
            let form = ShippingForm {
                fullname: fullname.unwrap_or(prefill.fullname),
                email: email.unwrap_or(prefill.email),
                address: address.unwrap_or(prefill.address),
                mobile: mobile.unwrap_or(prefill.mobile),
                is_international: international,
            };
            let totals = shop.submit_shipping(&form)?;
            info!("Shipping details saved");
            log_totals(&totals);
        }
        CheckoutAction::Payment {
            method,
            name,
            card_number,
            expiry,
            ccv,
        } => {
            if !enter(shop, CheckoutStep::Payment)? {
                return Ok(());
            }
            let prefill = shop.checkout.payment_prefill();
            let form = PaymentForm {
                method,
                name: name.unwrap_or(prefill.name),
                card_number: card_number.unwrap_or(prefill.card_number),
                expiry: expiry.unwrap_or(prefill.expiry),
                ccv: ccv.unwrap_or(prefill.ccv),
            };
            let completion = shop.place_order(&form)?;
            info!(
                "Order placed: {} line(s), paid by {}",
                completion.order.lines.len(),
                completion.order.payment_method
            );
            log_totals(&completion.order.totals);
            info!("Continue at {}", completion.redirect);
        }
        CheckoutAction::Status => {
            let step = shop.checkout.current_step(&shop.cart);
            info!("Current step: {:?} ({})", step, step.route());
            if let Some(shipping) = &shop.checkout.draft().shipping {
                info!("Ship to: {}, {}", shipping.fullname, shipping.address);
            }
            if let Some(payment) = &shop.checkout.draft().payment {
                info!("Pay with: {} {}", payment.method, payment.masked_card_number());
            }
        }
        CheckoutAction::Reset => {
            shop.checkout.reset_checkout();
            info!("Checkout details cleared");
        }
    }
    Ok(())
}
