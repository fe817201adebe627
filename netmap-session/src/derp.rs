//! DERP map: the one sticky field with its own nested sticky semantics
//! (§4.2 "DerpMap sticky merge").

use std::collections::BTreeMap;

/// Per-region home-selection scoring, nested inside [`DerpMap`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerpHomeParams {
    pub region_score: Option<BTreeMap<i32, u32>>,
}

impl DerpHomeParams {
    /// Sub-merge: an absent `region_score` inherits from `prior`.
    fn merged_with_prior(mut self, prior: &DerpHomeParams) -> DerpHomeParams {
        if self.region_score.is_none() {
            self.region_score = prior.region_score.clone();
        }
        self
    }
}

/// `{regions, omit_default_regions, home_params}`. Absent fields at any
/// level inherit from the previously stored `DerpMap`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DerpMap {
    pub regions: Option<BTreeMap<i32, String>>,
    pub omit_default_regions: bool,
    pub home_params: Option<DerpHomeParams>,
}

impl DerpMap {
    /// Merge an incoming `DerpMap` against the previously stored one, per
    /// §4.2: `regions` and `omit_default_regions` travel together as a pair
    /// from the prior map when `regions` is absent; `home_params` is
    /// inherited whole when absent, otherwise sub-merged field-by-field.
    pub fn merge_sticky(incoming: &DerpMap, prior: Option<&DerpMap>) -> DerpMap {
        let mut merged = incoming.clone();

        if let Some(prior) = prior {
            if merged.regions.is_none() {
                merged.regions = prior.regions.clone();
                merged.omit_default_regions = prior.omit_default_regions;
            }

            merged.home_params = match (merged.home_params, &prior.home_params) {
                (None, prior_params) => prior_params.clone(),
                (Some(incoming_params), Some(prior_params)) => {
                    Some(incoming_params.merged_with_prior(prior_params))
                }
                (Some(incoming_params), None) => Some(incoming_params),
            };
        }

        merged
    }
}
