/// Error returned when a string does not name a known enum variant.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {field}: '{value}'")]
pub struct EnumParseError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Serialization goes through the same canonical strings, so the wire
/// form always round-trips with `FromStr`.
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = EnumParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(EnumParseError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

str_enum!(Area {
    Ti => "TI",
    Retalho => "Retalho",
    Rh => "RH",
    Marketing => "Marketing",
});

str_enum!(DocumentFormat {
    Pdf => "pdf",
    Docx => "docx",
    Xlsx => "xlsx",
});

str_enum!(MilestoneStatus {
    Planned => "planned",
    InProgress => "in_progress",
    Completed => "completed",
    Delayed => "delayed",
    Cancelled => "cancelled",
});

str_enum!(ErrorCode {
    UnsupportedFormat => "unsupported_format",
    CorruptDocument => "corrupt_document",
    EmptyDocument => "empty_document",
    PayloadTooLarge => "payload_too_large",
    UnknownArea => "unknown_area",
    UnsupportedAreaFormatCombination => "unsupported_area_format_combination",
    NoExtractableContent => "no_extractable_content",
    AmbiguousPeriod => "ambiguous_period",
    PersistenceUnavailable => "persistence_unavailable",
    Timeout => "timeout",
    Internal => "internal_error",
});

str_enum!(DefectCode {
    MissingField => "missing_field",
    NotNumeric => "not_numeric",
    UnknownKpi => "unknown_kpi",
    UnknownUnit => "unknown_unit",
    InvalidDate => "invalid_date",
    UnknownStatus => "unknown_status",
    MissingActualDate => "missing_actual_date",
    ConflictingValues => "conflicting_values",
    MissingPeriod => "missing_period",
    UnrecognizedPeriod => "unrecognized_period",
});

impl Area {
    /// Parse a client-supplied area tag, tolerating case differences.
    /// Exact-match first so the canonical tags stay authoritative.
    pub fn from_tag(tag: &str) -> Result<Self, EnumParseError> {
        let trimmed = tag.trim();
        if let Ok(area) = trimmed.parse() {
            return Ok(area);
        }
        match trimmed.to_lowercase().as_str() {
            "ti" => Ok(Self::Ti),
            "retalho" => Ok(Self::Retalho),
            "rh" => Ok(Self::Rh),
            "marketing" => Ok(Self::Marketing),
            _ => Err(EnumParseError {
                field: "Area".into(),
                value: trimmed.into(),
            }),
        }
    }
}

impl DocumentFormat {
    /// Parse a declared format tag, tolerating case and a leading dot
    /// (clients sometimes send the file extension verbatim).
    pub fn from_tag(tag: &str) -> Result<Self, EnumParseError> {
        let trimmed = tag.trim().trim_start_matches('.');
        trimmed.to_lowercase().parse().map_err(|_| EnumParseError {
            field: "DocumentFormat".into(),
            value: trimmed.into(),
        })
    }
}
