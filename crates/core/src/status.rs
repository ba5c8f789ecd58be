//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:literal => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Lower-case name as stored in the lookup table and exposed over the API.
            pub fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $label ),+
                }
            }

            /// Resolve a database status ID, `None` for ids outside the seed data.
            pub fn from_id(id: StatusId) -> Option<Self> {
                match id {
                    $( $val => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

define_status_enum! {
    /// Tutoring request lifecycle status.
    RequestStatus {
        Open = 1 => "open",
        Matched = 2 => "matched",
        Closed = 3 => "closed",
    }
}

define_status_enum! {
    /// Candidate pairing status. `Accepted`, `Declined` and `Expired` are terminal.
    MatchStatus {
        Proposed = 1 => "proposed",
        Accepted = 2 => "accepted",
        Declined = 3 => "declined",
        Expired = 4 => "expired",
    }
}

define_status_enum! {
    /// Notification outbox event status.
    OutboxStatus {
        Pending = 1 => "pending",
        Sent = 2 => "sent",
        Failed = 3 => "failed",
    }
}
