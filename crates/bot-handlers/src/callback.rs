use common::types::Id;

use crate::{PayloadData, CHECK_SUBSCRIBE_FLAG, DISTRICT_FLAG, REGIONS_FLAG, REGION_FLAG};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Callback {
    /// Back to the region menu (also the re-check resume target)
    ShowRegions,
    ShowDistricts { region_id: Id },
    PickDistrict { district_id: Id },
    /// User-triggered re-run of the membership gate
    CheckSubscribe,
}

impl Callback {
    pub(crate) fn show_regions() -> Self {
        Self::ShowRegions
    }
    pub(crate) fn show_districts(region_id: Id) -> Self {
        Self::ShowDistricts { region_id }
    }
    pub(crate) fn pick_district(district_id: Id) -> Self {
        Self::PickDistrict { district_id }
    }
    pub(crate) fn check_subscribe() -> Self {
        Self::CheckSubscribe
    }
}

impl PayloadData for Callback {
    type Error = CallbackParseError;

    fn to_payload(&self) -> String {
        match self {
            Self::ShowRegions => REGIONS_FLAG.to_string(),
            Self::ShowDistricts { region_id } => format!("{REGION_FLAG}:{region_id}"),
            Self::PickDistrict { district_id } => format!("{DISTRICT_FLAG}:{district_id}"),
            Self::CheckSubscribe => CHECK_SUBSCRIBE_FLAG.to_string(),
        }
    }

    fn try_from_payload(payload: &str) -> Result<Self, Self::Error> {
        let data: Vec<_> = payload.split(':').collect();
        let res = match (data[0], data.len()) {
            (REGIONS_FLAG, 1) => Self::ShowRegions,
            (CHECK_SUBSCRIBE_FLAG, 1) => Self::CheckSubscribe,
            (REGION_FLAG, 2) => Self::ShowDistricts {
                region_id: parse_id(data[1])?,
            },
            (DISTRICT_FLAG, 2) => Self::PickDistrict {
                district_id: parse_id(data[1])?,
            },
            (REGIONS_FLAG | CHECK_SUBSCRIBE_FLAG | REGION_FLAG | DISTRICT_FLAG, _) => {
                return Err(CallbackParseError::InvalidCallback)
            }
            _ => return Err(CallbackParseError::UnknownCallbackType),
        };
        Ok(res)
    }
}

fn parse_id(s: &str) -> Result<Id, CallbackParseError> {
    s.parse().map_err(|_| CallbackParseError::InvalidToken)
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CallbackParseError {
    InvalidCallback,
    InvalidToken,
    UnknownCallbackType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let table = [
            (Callback::show_regions(), "regions"),
            (Callback::show_districts(7), "region:7"),
            (Callback::pick_district(42), "district:42"),
            (Callback::check_subscribe(), "checksub"),
        ];
        for (cb, payload) in table {
            assert_eq!(cb.to_payload(), payload);
            assert_eq!(Callback::try_from_payload(payload), Ok(cb));
        }
    }

    #[test]
    fn test_invalid_payloads_are_rejected() {
        let table = [
            ("", CallbackParseError::UnknownCallbackType),
            ("lang:en", CallbackParseError::UnknownCallbackType),
            ("region", CallbackParseError::InvalidCallback),
            ("region:7:9", CallbackParseError::InvalidCallback),
            ("district:abc", CallbackParseError::InvalidToken),
            ("checksub:1", CallbackParseError::InvalidCallback),
        ];
        for (payload, expected) in table {
            assert_eq!(Callback::try_from_payload(payload), Err(expected), "payload {payload:?}");
        }
    }
}
