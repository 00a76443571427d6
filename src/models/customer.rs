use serde::Serialize;
use serde_json::Value;

use super::booking::Booking;

/// Display label for a renter whose booking is confirmed or completed but
/// not yet checked out.
pub const STILL_LIVING: &str = "still living";

/// Denormalized customer row shown on the owner's management screen.
/// Recomputed from the raw bookings on every load and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerRecord {
    pub id: i64,
    pub renter_name: String,
    pub email: String,
    pub phone_number: String,
    pub property_name: String,
    pub monthly_payment: f64,
    pub status: String,
    pub move_in_date: Option<String>,
    pub check_out_date: Option<String>,
}

type TextAccessor = fn(&Booking) -> Option<&str>;
type AmountAccessor = fn(&Booking) -> Option<&Value>;

/// Walk an ordered accessor chain and return the first non-blank hit.
fn first_text<'a>(booking: &'a Booking, accessors: &[TextAccessor]) -> Option<&'a str> {
    accessors
        .iter()
        .find_map(|get| get(booking).map(str::trim).filter(|s| !s.is_empty()))
}

/// Walk an ordered accessor chain and return the first populated money
/// field. A JSON null or blank string does not count as populated.
fn first_amount<'a>(booking: &'a Booking, accessors: &[AmountAccessor]) -> Option<&'a Value> {
    accessors.iter().find_map(|get| {
        get(booking).filter(|v| match v {
            Value::Number(_) => true,
            Value::String(s) => !s.trim().is_empty(),
            _ => false,
        })
    })
}

/// Parse a string-or-number money value into a non-negative amount.
/// Anything malformed collapses to 0.0, never NaN.
fn parse_amount(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

impl From<&Booking> for CustomerRecord {
    fn from(booking: &Booking) -> Self {
        let renter_name = first_text(
            booking,
            &[
                |b| b.renter_details.as_ref()?.full_name.as_deref(),
                |b| b.renter_details.as_ref()?.username.as_deref(),
            ],
        )
        .unwrap_or("Unknown")
        .to_string();

        let email = first_text(booking, &[|b| b.renter_details.as_ref()?.email.as_deref()])
            .unwrap_or("N/A")
            .to_string();

        let phone_number = first_text(
            booking,
            &[|b| b.renter_details.as_ref()?.phone_number.as_deref()],
        )
        .unwrap_or("N/A")
        .to_string();

        let property_name = first_text(
            booking,
            &[|b| b.property_details.as_ref()?.title.as_deref()],
        )
        .unwrap_or("Unknown Property")
        .to_string();

        let monthly_payment = first_amount(
            booking,
            &[
                |b| b.monthly_rent.as_ref(),
                |b| b.property_details.as_ref()?.rent_price.as_ref(),
                |b| b.property_details.as_ref()?.monthly_rent.as_ref(),
            ],
        )
        .map(parse_amount)
        .unwrap_or(0.0);

        let status = if booking.has_occupied_status() {
            STILL_LIVING.to_string()
        } else {
            match booking.status.as_deref().map(str::trim) {
                Some(raw) if !raw.is_empty() => raw.to_string(),
                _ => "unknown".to_string(),
            }
        };

        let move_in_date = first_text(
            booking,
            &[|b| b.start_date.as_deref(), |b| b.confirmed_at.as_deref()],
        )
        .map(str::to_string);

        let check_out_date = first_text(
            booking,
            &[
                |b| b.completed_at.as_deref(),
                |b| b.updated_at.as_deref(),
                |b| b.end_date.as_deref(),
            ],
        )
        .map(str::to_string);

        CustomerRecord {
            id: booking.id,
            renter_name,
            email,
            phone_number,
            property_name,
            monthly_payment,
            status,
            move_in_date,
            check_out_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::booking::{PropertyDetails, RenterDetails};
    use serde_json::json;

    fn bare_booking(id: i64) -> Booking {
        Booking {
            id,
            ..Booking::default()
        }
    }

    #[test]
    fn test_full_booking_maps_every_field() {
        let booking = Booking {
            id: 1,
            status: Some("confirmed".to_string()),
            renter_details: Some(RenterDetails {
                full_name: Some("Dara".to_string()),
                ..RenterDetails::default()
            }),
            property_details: Some(PropertyDetails {
                title: Some("Sunny Flat".to_string()),
                rent_price: Some(json!("450.00")),
                ..PropertyDetails::default()
            }),
            start_date: Some("2024-01-05".to_string()),
            ..Booking::default()
        };

        let customer = CustomerRecord::from(&booking);
        assert_eq!(customer.id, 1);
        assert_eq!(customer.renter_name, "Dara");
        assert_eq!(customer.property_name, "Sunny Flat");
        assert_eq!(customer.monthly_payment, 450.0);
        assert_eq!(customer.status, STILL_LIVING);
        assert_eq!(customer.move_in_date.as_deref(), Some("2024-01-05"));
    }

    #[test]
    fn test_missing_renter_details_degrades_to_placeholders() {
        let customer = CustomerRecord::from(&bare_booking(7));
        assert_eq!(customer.renter_name, "Unknown");
        assert_eq!(customer.email, "N/A");
        assert_eq!(customer.phone_number, "N/A");
        assert_eq!(customer.property_name, "Unknown Property");
        assert_eq!(customer.monthly_payment, 0.0);
        assert_eq!(customer.status, "unknown");
        assert!(customer.move_in_date.is_none());
        assert!(customer.check_out_date.is_none());
    }

    #[test]
    fn test_blank_full_name_falls_back_to_username() {
        let booking = Booking {
            renter_details: Some(RenterDetails {
                full_name: Some("   ".to_string()),
                username: Some("dara_r".to_string()),
                ..RenterDetails::default()
            }),
            ..bare_booking(2)
        };
        assert_eq!(CustomerRecord::from(&booking).renter_name, "dara_r");
    }

    #[test]
    fn test_confirmed_and_completed_label_as_still_living() {
        for status in ["confirmed", "completed"] {
            let booking = Booking {
                status: Some(status.to_string()),
                ..bare_booking(3)
            };
            assert_eq!(CustomerRecord::from(&booking).status, STILL_LIVING);
        }
    }

    #[test]
    fn test_other_statuses_pass_through_unchanged() {
        for status in ["pending", "cancelled", "rejected"] {
            let booking = Booking {
                status: Some(status.to_string()),
                ..bare_booking(4)
            };
            assert_eq!(CustomerRecord::from(&booking).status, status);
        }
    }

    #[test]
    fn test_payment_accepts_numbers_and_strings() {
        let from_number = Booking {
            monthly_rent: Some(json!(725)),
            ..bare_booking(5)
        };
        assert_eq!(CustomerRecord::from(&from_number).monthly_payment, 725.0);

        let from_string = Booking {
            monthly_rent: Some(json!("  512.50 ")),
            ..bare_booking(5)
        };
        assert_eq!(CustomerRecord::from(&from_string).monthly_payment, 512.5);
    }

    #[test]
    fn test_payment_source_order_prefers_top_level_rent() {
        let booking = Booking {
            monthly_rent: Some(json!("300")),
            property_details: Some(PropertyDetails {
                rent_price: Some(json!("999")),
                ..PropertyDetails::default()
            }),
            ..bare_booking(6)
        };
        assert_eq!(CustomerRecord::from(&booking).monthly_payment, 300.0);
    }

    #[test]
    fn test_payment_empty_string_yields_to_next_source() {
        let booking = Booking {
            monthly_rent: Some(json!("")),
            property_details: Some(PropertyDetails {
                rent_price: Some(json!("640.00")),
                monthly_rent: Some(json!("111")),
                ..PropertyDetails::default()
            }),
            ..bare_booking(6)
        };
        assert_eq!(CustomerRecord::from(&booking).monthly_payment, 640.0);
    }

    #[test]
    fn test_payment_malformed_or_negative_collapses_to_zero() {
        let malformed = Booking {
            monthly_rent: Some(json!("four fifty")),
            ..bare_booking(8)
        };
        assert_eq!(CustomerRecord::from(&malformed).monthly_payment, 0.0);

        let negative = Booking {
            monthly_rent: Some(json!(-120.0)),
            ..bare_booking(8)
        };
        assert_eq!(CustomerRecord::from(&negative).monthly_payment, 0.0);
    }

    #[test]
    fn test_move_in_date_falls_back_to_confirmation_time() {
        let booking = Booking {
            confirmed_at: Some("2024-02-11T09:30:00Z".to_string()),
            ..bare_booking(9)
        };
        assert_eq!(
            CustomerRecord::from(&booking).move_in_date.as_deref(),
            Some("2024-02-11T09:30:00Z")
        );
    }

    #[test]
    fn test_check_out_date_chain() {
        let booking = Booking {
            updated_at: Some("2024-05-02".to_string()),
            end_date: Some("2024-06-01".to_string()),
            ..bare_booking(10)
        };
        // completed_at missing, updated_at wins over end_date
        assert_eq!(
            CustomerRecord::from(&booking).check_out_date.as_deref(),
            Some("2024-05-02")
        );

        let only_end = Booking {
            end_date: Some("2024-06-01".to_string()),
            ..bare_booking(10)
        };
        assert_eq!(
            CustomerRecord::from(&only_end).check_out_date.as_deref(),
            Some("2024-06-01")
        );
    }

    #[test]
    fn test_mapper_is_deterministic() {
        let booking = Booking {
            status: Some("confirmed".to_string()),
            monthly_rent: Some(json!("450.00")),
            ..bare_booking(11)
        };
        assert_eq!(
            CustomerRecord::from(&booking),
            CustomerRecord::from(&booking)
        );
    }
}
