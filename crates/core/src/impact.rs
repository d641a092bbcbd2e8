//! Infrastructure impact analysis
//!
//! Tests each registered asset against a perimeter polygon. Boundary points count
//! as impacted, so an asset sitting exactly on the ignition point of a projected
//! perimeter is always reported.

use crate::core_types::infrastructure::{AssetCategory, InfrastructureAsset};
use crate::spread::polygon::Polygon;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Containment result for one asset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactFinding<'a> {
    /// The asset tested
    pub asset: &'a InfrastructureAsset,
    /// Asset lies inside or on the perimeter
    pub inside: bool,
}

/// Test every asset, preserving input order
pub fn assess<'a>(perimeter: &Polygon, assets: &'a [InfrastructureAsset]) -> Vec<ImpactFinding<'a>> {
    assets
        .iter()
        .map(|asset| ImpactFinding {
            asset,
            inside: perimeter.contains(&asset.location()),
        })
        .collect()
}

/// Assets inside or on the perimeter, preserving input order
pub fn find_impacted<'a>(
    perimeter: &Polygon,
    assets: &'a [InfrastructureAsset],
) -> Vec<&'a InfrastructureAsset> {
    let impacted: Vec<_> = assess(perimeter, assets)
        .into_iter()
        .filter(|finding| finding.inside)
        .map(|finding| finding.asset)
        .collect();

    debug!(
        assets = assets.len(),
        impacted = impacted.len(),
        "impact analysis complete"
    );
    impacted
}

/// One impacted asset in a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactEntry {
    /// Asset id
    pub asset_id: u64,
    /// Asset category
    pub category: AssetCategory,
    /// Asset name
    pub name: String,
}

/// Serializable summary of impacted assets
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ImpactReport {
    /// Impacted assets in input order
    pub entries: Vec<ImpactEntry>,
    /// Impacted count per category
    pub by_category: Vec<(AssetCategory, usize)>,
}

impl ImpactReport {
    /// Build a report from the impacted subset of `findings`
    ///
    /// `by_category` lists every category in [`AssetCategory::ALL`] order,
    /// including those with zero impacted assets.
    pub fn from_findings(findings: &[ImpactFinding<'_>]) -> Self {
        let mut counts: FxHashMap<AssetCategory, usize> = FxHashMap::default();
        let entries = findings
            .iter()
            .filter(|f| f.inside)
            .map(|f| {
                *counts.entry(f.asset.category).or_default() += 1;
                ImpactEntry {
                    asset_id: f.asset.id,
                    category: f.asset.category,
                    name: f.asset.name.clone(),
                }
            })
            .collect();

        let by_category = AssetCategory::ALL
            .iter()
            .map(|c| (*c, counts.get(c).copied().unwrap_or(0)))
            .collect();

        Self {
            entries,
            by_category,
        }
    }

    /// Number of impacted assets
    pub fn total(&self) -> usize {
        self.entries.len()
    }

    /// Impacted count for one category
    pub fn count(&self, category: AssetCategory) -> usize {
        self.by_category
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, n)| *n)
    }
}
