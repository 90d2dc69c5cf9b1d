use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

/// Payment reference that marks a booking as free of charge.
pub const FREE_PAYMENT_REF: &str = "free";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Free,
    Failed,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Reserved,
    Paid,
    Approved,
    Completed,
    Cancelled,
}

macro_rules! string_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(format!("unknown {} '{}'", stringify!($ty), other)),
                }
            }
        }
    };
}

string_enum!(PaymentStatus {
    Pending => "pending",
    Paid => "paid",
    Free => "free",
    Failed => "failed",
    Refunded => "refunded",
});

string_enum!(ApprovalStatus {
    Pending => "pending",
    Approved => "approved",
    Rejected => "rejected",
});

string_enum!(BookingStatus {
    Reserved => "reserved",
    Paid => "paid",
    Approved => "approved",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// One student's seat in a slot. Rows are never deleted.
///
/// Status columns are stored as text; use the typed accessors to read them.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub student_id: String,
    pub slot_id: String,
    pub teacher_id: String,
    pub payment_status: String,
    pub approval_status: String,
    pub status: String,
    pub amount: i64,
    pub payment_ref: String,
    pub meeting_link: Option<String>,
    pub meeting_event_id: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub student_email_sent: bool,
    pub teacher_email_sent: bool,
    /// Failed delivery attempts; the catch-up pass serves the least-tried rows first.
    pub notify_attempts: i32,
    pub last_notify_attempt_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub student_id: String,
    pub slot_id: String,
    pub teacher_id: String,
    pub payment_ref: String,
    pub amount: i64,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        let (payment_status, amount) = if params.payment_ref == FREE_PAYMENT_REF {
            (PaymentStatus::Free, 0)
        } else {
            (PaymentStatus::Paid, params.amount)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            student_id: params.student_id,
            slot_id: params.slot_id,
            teacher_id: params.teacher_id,
            payment_status: payment_status.to_string(),
            approval_status: ApprovalStatus::Pending.to_string(),
            status: BookingStatus::Paid.to_string(),
            amount,
            payment_ref: params.payment_ref,
            meeting_link: None,
            meeting_event_id: None,
            approved_by: None,
            approved_at: None,
            student_email_sent: false,
            teacher_email_sent: false,
            notify_attempts: 0,
            last_notify_attempt_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn payment(&self) -> Option<PaymentStatus> {
        self.payment_status.parse().ok()
    }

    pub fn approval(&self) -> Option<ApprovalStatus> {
        self.approval_status.parse().ok()
    }

    pub fn lifecycle(&self) -> Option<BookingStatus> {
        self.status.parse().ok()
    }

    /// Settled (paid or free) and still waiting for a box approval.
    pub fn is_pending_approval(&self) -> bool {
        matches!(self.payment(), Some(PaymentStatus::Paid | PaymentStatus::Free))
            && self.approval() == Some(ApprovalStatus::Pending)
            && self.lifecycle() == Some(BookingStatus::Paid)
    }

    pub fn is_approved(&self) -> bool {
        self.approval() == Some(ApprovalStatus::Approved)
    }

    /// Approved with a link but the notification guard never flipped.
    pub fn needs_notification(&self) -> bool {
        self.is_approved() && self.meeting_link.is_some() && !self.student_email_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(payment_ref: &str) -> NewBookingParams {
        NewBookingParams {
            student_id: "s-1".into(),
            slot_id: "slot-1".into(),
            teacher_id: "t-1".into(),
            payment_ref: payment_ref.into(),
            amount: 49900,
        }
    }

    #[test]
    fn test_free_sentinel_zeroes_amount() {
        let booking = Booking::new(params(FREE_PAYMENT_REF));
        assert_eq!(booking.payment(), Some(PaymentStatus::Free));
        assert_eq!(booking.amount, 0);
        assert!(booking.is_pending_approval());
    }

    #[test]
    fn test_payment_reference_marks_paid() {
        let booking = Booking::new(params("pay_N9x81"));
        assert_eq!(booking.payment(), Some(PaymentStatus::Paid));
        assert_eq!(booking.amount, 49900);
        assert_eq!(booking.lifecycle(), Some(BookingStatus::Paid));
        assert_eq!(booking.approval(), Some(ApprovalStatus::Pending));
    }

    #[test]
    fn test_status_text_round_trips_through_enum() {
        assert_eq!("refunded".parse::<PaymentStatus>(), Ok(PaymentStatus::Refunded));
        assert!("REFUNDED".parse::<PaymentStatus>().is_err());
        assert_eq!(BookingStatus::Cancelled.as_str(), "cancelled");
    }
}
