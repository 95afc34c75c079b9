//! Category policy: default price bands, localized category aliases, and the
//! specialty filter deciding which open jobs a professional can see.

use std::collections::BTreeSet;

use super::domain::{JobCategory, PriceBand};

/// Localized (Turkish) and English spellings mapped to canonical categories.
/// Keys are already case-folded.
const CATEGORY_ALIASES: &[(&str, JobCategory)] = &[
    ("plumbing", JobCategory::Plumbing),
    ("tesisat", JobCategory::Plumbing),
    ("electrical", JobCategory::Electrical),
    ("elektrik", JobCategory::Electrical),
    ("hvac", JobCategory::Hvac),
    ("isıtma soğutma", JobCategory::Hvac),
    ("isıtma/soğutma", JobCategory::Hvac),
    ("appliances", JobCategory::Appliances),
    ("beyaz eşya", JobCategory::Appliances),
    ("paint", JobCategory::Paint),
    ("boya", JobCategory::Paint),
    ("furniture", JobCategory::Furniture),
    ("mobilya", JobCategory::Furniture),
    ("flooring", JobCategory::Flooring),
    ("zemin", JobCategory::Flooring),
    ("roofing", JobCategory::Roofing),
    ("çatı", JobCategory::Roofing),
    ("general", JobCategory::General),
    ("genel", JobCategory::General),
    ("other", JobCategory::Other),
    ("diğer", JobCategory::Other),
];

impl JobCategory {
    /// Default acceptable quote band for jobs created without an estimate.
    pub const fn default_band(self) -> PriceBand {
        match self {
            JobCategory::Plumbing => PriceBand::new(300, 5_000),
            JobCategory::Electrical => PriceBand::new(200, 3_000),
            JobCategory::Hvac => PriceBand::new(500, 10_000),
            JobCategory::Appliances => PriceBand::new(150, 5_000),
            JobCategory::Paint => PriceBand::new(500, 10_000),
            JobCategory::Furniture => PriceBand::new(200, 8_000),
            JobCategory::Flooring => PriceBand::new(1_000, 15_000),
            JobCategory::Roofing => PriceBand::new(2_000, 20_000),
            JobCategory::General => PriceBand::new(200, 3_000),
            JobCategory::Other => PriceBand::new(150, 5_000),
        }
    }

    /// Resolve a free-text category or specialty through the alias table.
    pub fn from_alias(raw: &str) -> Option<Self> {
        let folded = raw.trim().to_lowercase();
        CATEGORY_ALIASES
            .iter()
            .find(|(alias, _)| *alias == folded)
            .map(|(_, category)| *category)
    }

    pub fn aliases(self) -> impl Iterator<Item = &'static str> {
        CATEGORY_ALIASES
            .iter()
            .filter(move |(_, category)| *category == self)
            .map(|(alias, _)| *alias)
    }
}

/// Which unassigned pending jobs a professional may see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialtyFilter {
    /// No specialties declared: every open job is visible.
    Any,
    /// Only these categories. May be empty when every declared specialty is unrecognised.
    Only(BTreeSet<JobCategory>),
}

impl SpecialtyFilter {
    pub fn from_specialties<S: AsRef<str>>(specialties: &[S]) -> Self {
        let declared: Vec<&str> = specialties
            .iter()
            .map(|specialty| specialty.as_ref().trim())
            .filter(|specialty| !specialty.is_empty())
            .collect();

        if declared.is_empty() {
            return Self::Any;
        }

        Self::Only(
            declared
                .into_iter()
                .filter_map(JobCategory::from_alias)
                .collect(),
        )
    }

    pub fn allows(&self, category: JobCategory) -> bool {
        match self {
            SpecialtyFilter::Any => true,
            SpecialtyFilter::Only(categories) => categories.contains(&category),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("estimated band {min_price}-{max_price} TL is inverted")]
    InvertedBand { min_price: u32, max_price: u32 },
    #[error("estimated band {min_price}-{max_price} TL does not overlap the {category} range")]
    OutsideCategory {
        category: JobCategory,
        min_price: u32,
        max_price: u32,
    },
}

/// Pick the band for a new job. A supplied estimate is kept verbatim when it
/// fits inside the category default and is clipped to it otherwise.
pub fn resolve_band(
    category: JobCategory,
    estimate: Option<PriceBand>,
) -> Result<PriceBand, PricingError> {
    let default = category.default_band();
    let Some(estimate) = estimate else {
        return Ok(default);
    };

    if estimate.min_price > estimate.max_price {
        return Err(PricingError::InvertedBand {
            min_price: estimate.min_price,
            max_price: estimate.max_price,
        });
    }

    if estimate.is_within(&default) {
        return Ok(estimate);
    }

    let clipped = PriceBand::new(
        estimate.min_price.max(default.min_price),
        estimate.max_price.min(default.max_price),
    );
    if clipped.min_price > clipped.max_price {
        return Err(PricingError::OutsideCategory {
            category,
            min_price: estimate.min_price,
            max_price: estimate.max_price,
        });
    }

    tracing::debug!(
        %category,
        requested_min = estimate.min_price,
        requested_max = estimate.max_price,
        "estimated band clipped to category range"
    );
    Ok(clipped)
}

/// External price estimation (e.g. photo analysis).
pub trait PriceEstimator: Send + Sync {
    fn estimate(&self, category: JobCategory, photo_url: &str) -> Option<PriceBand>;
}

/// Stand-in for photo analysis: trims a fifth of the category span from each end.
#[derive(Debug, Default, Clone, Copy)]
pub struct CategoryEstimator;

impl PriceEstimator for CategoryEstimator {
    fn estimate(&self, category: JobCategory, photo_url: &str) -> Option<PriceBand> {
        if photo_url.trim().is_empty() {
            return None;
        }
        let band = category.default_band();
        let trim = (band.max_price - band.min_price) / 5;
        Some(PriceBand::new(band.min_price + trim, band.max_price - trim))
    }
}
