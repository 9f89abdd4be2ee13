use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::config::normalize_phone_digits;
use crate::domain::order::CustomerDetails;
use crate::forms::products::{sanitize_inline_text, sanitize_multiline_text};

const MIN_PHONE_DIGITS: usize = 10;
const MAX_PHONE_DIGITS: usize = 15;

pub type CheckoutFormResult<T> = Result<T, CheckoutFormError>;

#[derive(Debug, Error)]
pub enum CheckoutFormError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Please enter your name")]
    NameRequired,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
    #[error("Phone numbers do not match")]
    PhoneMismatch,
    #[error("Please enter your delivery address")]
    AddressRequired,
}

/// Contact details posted from the checkout page.
#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
pub struct CheckoutForm {
    #[validate(length(max = 128))]
    pub name: String,
    pub phone: String,
    pub confirm_phone: String,
    #[validate(length(max = 1000))]
    pub address: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub notes: String,
}

impl CheckoutForm {
    pub fn into_customer_details(self) -> CheckoutFormResult<CustomerDetails> {
        self.validate()?;

        let name = sanitize_inline_text(&self.name);
        if name.is_empty() {
            return Err(CheckoutFormError::NameRequired);
        }

        let phone = normalize_phone_digits(&self.phone);
        if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&phone.len()) {
            return Err(CheckoutFormError::InvalidPhone);
        }
        if normalize_phone_digits(&self.confirm_phone) != phone {
            return Err(CheckoutFormError::PhoneMismatch);
        }

        let address = sanitize_multiline_text(&self.address);
        if address.is_empty() {
            return Err(CheckoutFormError::AddressRequired);
        }

        let notes = Some(sanitize_multiline_text(&self.notes)).filter(|notes| !notes.is_empty());

        Ok(CustomerDetails {
            name,
            phone,
            address,
            notes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> CheckoutForm {
        CheckoutForm {
            name: " Asha  Menon ".to_string(),
            phone: "+91 98765 43210".to_string(),
            confirm_phone: "919876543210".to_string(),
            address: "12 Beach Road\nKochi".to_string(),
            notes: "  ".to_string(),
        }
    }

    #[test]
    fn builds_customer_details() {
        let details = form().into_customer_details().expect("valid");

        assert_eq!(details.name, "Asha Menon");
        assert_eq!(details.phone, "919876543210");
        assert_eq!(details.address, "12 Beach Road\nKochi");
        assert_eq!(details.notes, None);
    }

    #[test]
    fn rejects_short_phone() {
        let mut short = form();
        short.phone = "12345".to_string();
        short.confirm_phone = "12345".to_string();
        assert!(matches!(
            short.into_customer_details(),
            Err(CheckoutFormError::InvalidPhone)
        ));
    }

    #[test]
    fn rejects_mismatched_confirmation() {
        let mut mismatch = form();
        mismatch.confirm_phone = "919876543211".to_string();
        assert!(matches!(
            mismatch.into_customer_details(),
            Err(CheckoutFormError::PhoneMismatch)
        ));
    }

    #[test]
    fn rejects_missing_name_and_address() {
        let mut no_name = form();
        no_name.name = "\t".to_string();
        assert!(matches!(
            no_name.into_customer_details(),
            Err(CheckoutFormError::NameRequired)
        ));

        let mut no_address = form();
        no_address.address = "\n".to_string();
        assert!(matches!(
            no_address.into_customer_details(),
            Err(CheckoutFormError::AddressRequired)
        ));
    }
}
