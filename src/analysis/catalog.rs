// Feature catalog - resolves feature-name tokens into extractor routines
//
// A specification string is split on `, + - ; :`, each token is trimmed and
// lower-cased, and looked up in a static alias table (short codes and full
// names). Resolution happens once, at configuration time, into closed enums
// carrying any bound parameters; the per-frame path only matches on those.
//
// Unknown tokens resolve to an `Unresolved` marker instead of failing. The
// marker surfaces as `PipelineError::UnknownFeature` when the routine is
// first evaluated.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::features::{harmonic, spectral};
use crate::config::FeatureParams;
use crate::error::PipelineError;

/// Custom spectral routine: (mapped spectrum, frequency axis) -> value
pub type SpectralRoutine = Arc<dyn Fn(&[f32], &[f32]) -> f32 + Send + Sync>;

/// Custom harmonic routine: (full spectrum, peak bins, peak frequencies) -> value
pub type HarmonicRoutine = Arc<dyn Fn(&[f32], &[usize], &[f32]) -> f32 + Send + Sync>;

/// Canonical spectral catalog that `all` / `full` expand to
pub const SPECTRAL_CATALOG: &str = "centroid,spread,skewness,kurtosis,flatness,crest,rolloff,slope,decrease,entropy,noiseness,energy,contrast1,contrast2,contrast3,contrast4,contrast5,contrast6";

/// Canonical harmonic catalog that `all` / `full` expand to
pub const HARMONIC_CATALOG: &str =
    "inharmonicity,tristimulus1,tristimulus2,tristimulus3,oddeven,harmoniccentroid,harmonicdeviation";

/// Characters separating tokens in a feature specification
pub const DELIMITERS: [char; 5] = [',', '+', '-', ';', ':'];

/// Number of tristimulus components
const TRISTIMULUS_COMPONENTS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpectralKind {
    Centroid,
    Spread,
    Skewness,
    Kurtosis,
    Flatness,
    Crest,
    Rolloff,
    Slope,
    Decrease,
    Entropy,
    Noiseness,
    Energy,
}

impl SpectralKind {
    fn name(self) -> &'static str {
        match self {
            SpectralKind::Centroid => "centroid",
            SpectralKind::Spread => "spread",
            SpectralKind::Skewness => "skewness",
            SpectralKind::Kurtosis => "kurtosis",
            SpectralKind::Flatness => "flatness",
            SpectralKind::Crest => "crest",
            SpectralKind::Rolloff => "rolloff",
            SpectralKind::Slope => "slope",
            SpectralKind::Decrease => "decrease",
            SpectralKind::Entropy => "entropy",
            SpectralKind::Noiseness => "noiseness",
            SpectralKind::Energy => "energy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HarmonicKind {
    Inharmonicity,
    OddEven,
    Centroid,
    Deviation,
}

impl HarmonicKind {
    fn name(self) -> &'static str {
        match self {
            HarmonicKind::Inharmonicity => "inharmonicity",
            HarmonicKind::OddEven => "oddeven",
            HarmonicKind::Centroid => "harmoniccentroid",
            HarmonicKind::Deviation => "harmonicdeviation",
        }
    }
}

static SPECTRAL_ALIASES: Lazy<HashMap<&'static str, SpectralKind>> = Lazy::new(|| {
    use SpectralKind::*;
    HashMap::from([
        ("c", Centroid),
        ("centroid", Centroid),
        ("s", Spread),
        ("spread", Spread),
        ("sk", Skewness),
        ("skewness", Skewness),
        ("k", Kurtosis),
        ("kurtosis", Kurtosis),
        ("f", Flatness),
        ("flatness", Flatness),
        ("cr", Crest),
        ("crest", Crest),
        ("r", Rolloff),
        ("rolloff", Rolloff),
        ("sl", Slope),
        ("slope", Slope),
        ("d", Decrease),
        ("decrease", Decrease),
        ("e", Entropy),
        ("entropy", Entropy),
        ("n", Noiseness),
        ("noiseness", Noiseness),
        ("en", Energy),
        ("energy", Energy),
    ])
});

static HARMONIC_ALIASES: Lazy<HashMap<&'static str, HarmonicKind>> = Lazy::new(|| {
    use HarmonicKind::*;
    HashMap::from([
        ("i", Inharmonicity),
        ("inharmonicity", Inharmonicity),
        ("oer", OddEven),
        ("oddeven", OddEven),
        ("hc", Centroid),
        ("harmoniccentroid", Centroid),
        ("hd", Deviation),
        ("harmonicdeviation", Deviation),
    ])
});

/// Split a specification into normalised tokens
///
/// `all` / `full` (whole specification, any case) expand to `catalog`.
/// Empty tokens between adjacent delimiters are dropped.
pub fn tokenize(specification: &str, catalog: &str) -> Vec<String> {
    let trimmed = specification.trim();
    let source = if trimmed.eq_ignore_ascii_case("all") || trimmed.eq_ignore_ascii_case("full") {
        catalog
    } else {
        trimmed
    };

    source
        .split(|c: char| DELIMITERS.contains(&c))
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parse a numbered family member such as `contrast3` / `sc3`
///
/// Returns the index when `token` is one of `prefixes` followed by an
/// integer in `1..=max`.
fn numbered(token: &str, prefixes: &[&str], max: usize) -> Option<usize> {
    prefixes.iter().find_map(|prefix| {
        let suffix = token.strip_prefix(*prefix)?;
        if suffix.is_empty() || !suffix.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        suffix
            .parse::<usize>()
            .ok()
            .filter(|&n| (1..=max).contains(&n))
    })
}

/// One resolved (description, routine) pair
#[derive(Debug, Clone)]
pub struct FeatureEntry<F> {
    /// Canonical feature name, or the raw token when unresolved
    pub description: String,
    /// Resolved routine
    pub feature: F,
}

/// Spectral extractor routine with its bound parameters
#[derive(Clone)]
pub enum SpectralFeature {
    Centroid,
    Spread,
    Skewness,
    Kurtosis,
    Flatness { min_level: f32 },
    Crest,
    Rolloff { fraction: f32 },
    Slope,
    Decrease,
    Entropy,
    Noiseness { noise_frequency: f32 },
    Energy,
    Contrast { band: usize },
    Custom(SpectralRoutine),
    Unresolved(String),
}

impl SpectralFeature {
    /// Resolve one normalised token, binding parameters from `params`
    pub fn resolve(token: &str, params: &FeatureParams) -> FeatureEntry<Self> {
        if let Some(band) = numbered(token, &["contrast", "sc"], spectral::CONTRAST_BANDS) {
            return FeatureEntry {
                description: format!("contrast{}", band),
                feature: SpectralFeature::Contrast { band },
            };
        }

        let Some(&kind) = SPECTRAL_ALIASES.get(token) else {
            tracing::debug!("[FeatureCatalog] Unresolved spectral token '{}'", token);
            return FeatureEntry {
                description: token.to_string(),
                feature: SpectralFeature::Unresolved(token.to_string()),
            };
        };

        let feature = match kind {
            SpectralKind::Centroid => SpectralFeature::Centroid,
            SpectralKind::Spread => SpectralFeature::Spread,
            SpectralKind::Skewness => SpectralFeature::Skewness,
            SpectralKind::Kurtosis => SpectralFeature::Kurtosis,
            SpectralKind::Flatness => SpectralFeature::Flatness {
                min_level: params.min_level,
            },
            SpectralKind::Crest => SpectralFeature::Crest,
            SpectralKind::Rolloff => SpectralFeature::Rolloff {
                fraction: params.rolloff_fraction(),
            },
            SpectralKind::Slope => SpectralFeature::Slope,
            SpectralKind::Decrease => SpectralFeature::Decrease,
            SpectralKind::Entropy => SpectralFeature::Entropy,
            SpectralKind::Noiseness => SpectralFeature::Noiseness {
                noise_frequency: params.noise_frequency,
            },
            SpectralKind::Energy => SpectralFeature::Energy,
        };

        FeatureEntry {
            description: kind.name().to_string(),
            feature,
        }
    }

    /// Evaluate the routine over a mapped spectrum and its frequency axis
    ///
    /// `scratch` is working space for routines that reorder band values. It
    /// must be at least as long as `spectrum`; its contents are overwritten.
    pub fn evaluate(
        &self,
        spectrum: &[f32],
        frequencies: &[f32],
        scratch: &mut [f32],
    ) -> Result<f32, PipelineError> {
        let value = match self {
            SpectralFeature::Centroid => spectral::centroid(spectrum, frequencies),
            SpectralFeature::Spread => spectral::spread(spectrum, frequencies),
            SpectralFeature::Skewness => spectral::skewness(spectrum, frequencies),
            SpectralFeature::Kurtosis => spectral::kurtosis(spectrum, frequencies),
            SpectralFeature::Flatness { min_level } => spectral::flatness(spectrum, *min_level),
            SpectralFeature::Crest => spectral::crest(spectrum),
            SpectralFeature::Rolloff { fraction } => {
                spectral::rolloff(spectrum, frequencies, *fraction)
            }
            SpectralFeature::Slope => spectral::slope(spectrum, frequencies),
            SpectralFeature::Decrease => spectral::decrease(spectrum),
            SpectralFeature::Entropy => spectral::entropy(spectrum),
            SpectralFeature::Noiseness { noise_frequency } => {
                spectral::noiseness(spectrum, frequencies, *noise_frequency)
            }
            SpectralFeature::Energy => spectral::energy(spectrum),
            SpectralFeature::Contrast { band } => {
                spectral::contrast(spectrum, frequencies, *band, scratch)
            }
            SpectralFeature::Custom(routine) => routine(spectrum, frequencies),
            SpectralFeature::Unresolved(token) => {
                return Err(PipelineError::UnknownFeature {
                    token: token.clone(),
                })
            }
        };
        Ok(value)
    }

    /// The offending token, when this routine never resolved
    pub fn unresolved_token(&self) -> Option<&str> {
        match self {
            SpectralFeature::Unresolved(token) => Some(token.as_str()),
            _ => None,
        }
    }

    /// True for routines registered at run time
    pub fn is_custom(&self) -> bool {
        matches!(self, SpectralFeature::Custom(_))
    }
}

impl fmt::Debug for SpectralFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpectralFeature::Flatness { min_level } => {
                write!(f, "Flatness {{ min_level: {} }}", min_level)
            }
            SpectralFeature::Rolloff { fraction } => write!(f, "Rolloff {{ fraction: {} }}", fraction),
            SpectralFeature::Noiseness { noise_frequency } => {
                write!(f, "Noiseness {{ noise_frequency: {} }}", noise_frequency)
            }
            SpectralFeature::Contrast { band } => write!(f, "Contrast {{ band: {} }}", band),
            SpectralFeature::Custom(_) => write!(f, "Custom(..)"),
            SpectralFeature::Unresolved(token) => write!(f, "Unresolved({:?})", token),
            SpectralFeature::Centroid => write!(f, "Centroid"),
            SpectralFeature::Spread => write!(f, "Spread"),
            SpectralFeature::Skewness => write!(f, "Skewness"),
            SpectralFeature::Kurtosis => write!(f, "Kurtosis"),
            SpectralFeature::Crest => write!(f, "Crest"),
            SpectralFeature::Slope => write!(f, "Slope"),
            SpectralFeature::Decrease => write!(f, "Decrease"),
            SpectralFeature::Entropy => write!(f, "Entropy"),
            SpectralFeature::Energy => write!(f, "Energy"),
        }
    }
}

/// Harmonic extractor routine
#[derive(Clone)]
pub enum HarmonicFeature {
    Inharmonicity,
    Tristimulus { component: usize },
    OddEven,
    Centroid,
    Deviation,
    Custom(HarmonicRoutine),
    Unresolved(String),
}

impl HarmonicFeature {
    /// Resolve one normalised token
    pub fn resolve(token: &str) -> FeatureEntry<Self> {
        if let Some(component) = numbered(token, &["tristimulus", "t"], TRISTIMULUS_COMPONENTS) {
            return FeatureEntry {
                description: format!("tristimulus{}", component),
                feature: HarmonicFeature::Tristimulus { component },
            };
        }

        let Some(&kind) = HARMONIC_ALIASES.get(token) else {
            tracing::debug!("[FeatureCatalog] Unresolved harmonic token '{}'", token);
            return FeatureEntry {
                description: token.to_string(),
                feature: HarmonicFeature::Unresolved(token.to_string()),
            };
        };

        let feature = match kind {
            HarmonicKind::Inharmonicity => HarmonicFeature::Inharmonicity,
            HarmonicKind::OddEven => HarmonicFeature::OddEven,
            HarmonicKind::Centroid => HarmonicFeature::Centroid,
            HarmonicKind::Deviation => HarmonicFeature::Deviation,
        };

        FeatureEntry {
            description: kind.name().to_string(),
            feature,
        }
    }

    /// Evaluate the routine over the full spectrum and located peaks
    pub fn evaluate(
        &self,
        spectrum: &[f32],
        positions: &[usize],
        frequencies: &[f32],
    ) -> Result<f32, PipelineError> {
        let value = match self {
            HarmonicFeature::Inharmonicity => {
                harmonic::inharmonicity(spectrum, positions, frequencies)
            }
            HarmonicFeature::Tristimulus { component } => {
                harmonic::tristimulus(spectrum, positions, frequencies, *component)
            }
            HarmonicFeature::OddEven => harmonic::odd_even_ratio(spectrum, positions, frequencies),
            HarmonicFeature::Centroid => {
                harmonic::harmonic_centroid(spectrum, positions, frequencies)
            }
            HarmonicFeature::Deviation => {
                harmonic::harmonic_deviation(spectrum, positions, frequencies)
            }
            HarmonicFeature::Custom(routine) => routine(spectrum, positions, frequencies),
            HarmonicFeature::Unresolved(token) => {
                return Err(PipelineError::UnknownFeature {
                    token: token.clone(),
                })
            }
        };
        Ok(value)
    }

    /// The offending token, when this routine never resolved
    pub fn unresolved_token(&self) -> Option<&str> {
        match self {
            HarmonicFeature::Unresolved(token) => Some(token.as_str()),
            _ => None,
        }
    }

    /// True for routines registered at run time
    pub fn is_custom(&self) -> bool {
        matches!(self, HarmonicFeature::Custom(_))
    }
}

impl fmt::Debug for HarmonicFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonicFeature::Inharmonicity => write!(f, "Inharmonicity"),
            HarmonicFeature::Tristimulus { component } => {
                write!(f, "Tristimulus {{ component: {} }}", component)
            }
            HarmonicFeature::OddEven => write!(f, "OddEven"),
            HarmonicFeature::Centroid => write!(f, "Centroid"),
            HarmonicFeature::Deviation => write!(f, "Deviation"),
            HarmonicFeature::Custom(_) => write!(f, "Custom(..)"),
            HarmonicFeature::Unresolved(token) => write!(f, "Unresolved({:?})", token),
        }
    }
}

/// Resolve a spectral specification into ordered (description, routine) pairs
pub fn resolve_spectral(
    specification: &str,
    params: &FeatureParams,
) -> Vec<FeatureEntry<SpectralFeature>> {
    tokenize(specification, SPECTRAL_CATALOG)
        .iter()
        .map(|token| SpectralFeature::resolve(token, params))
        .collect()
}

/// Resolve a harmonic specification into ordered (description, routine) pairs
pub fn resolve_harmonic(specification: &str) -> Vec<FeatureEntry<HarmonicFeature>> {
    tokenize(specification, HARMONIC_CATALOG)
        .iter()
        .map(|token| HarmonicFeature::resolve(token))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptions<F>(entries: &[FeatureEntry<F>]) -> Vec<&str> {
        entries.iter().map(|e| e.description.as_str()).collect()
    }

    #[test]
    fn test_tokenize_all_delimiters_and_case() {
        let tokens = tokenize(" Centroid+SPREAD - f;r : c ,", SPECTRAL_CATALOG);
        assert_eq!(tokens, vec!["centroid", "spread", "f", "r", "c"]);
    }

    #[test]
    fn test_all_and_full_expand_to_catalog() {
        let expected: Vec<String> = SPECTRAL_CATALOG.split(',').map(String::from).collect();
        assert_eq!(tokenize("all", SPECTRAL_CATALOG), expected);
        assert_eq!(tokenize("FULL", SPECTRAL_CATALOG), expected);
    }

    #[test]
    fn test_short_codes_resolve_to_full_names() {
        let entries = resolve_spectral("c,s,sk,k,f,cr,r,sl,d,e,n,en", &FeatureParams::default());
        assert_eq!(
            descriptions(&entries),
            vec![
                "centroid", "spread", "skewness", "kurtosis", "flatness", "crest", "rolloff",
                "slope", "decrease", "entropy", "noiseness", "energy"
            ]
        );
        assert!(entries.iter().all(|e| e.feature.unresolved_token().is_none()));
    }

    #[test]
    fn test_full_catalog_resolves_completely() {
        let spectral = resolve_spectral("all", &FeatureParams::default());
        assert_eq!(descriptions(&spectral).join(","), SPECTRAL_CATALOG);
        assert!(spectral.iter().all(|e| e.feature.unresolved_token().is_none()));

        let harmonic = resolve_harmonic("full");
        assert_eq!(descriptions(&harmonic).join(","), HARMONIC_CATALOG);
        assert!(harmonic.iter().all(|e| e.feature.unresolved_token().is_none()));
    }

    #[test]
    fn test_parameters_are_bound_at_resolution() {
        let params = FeatureParams {
            min_level: 0.01,
            noise_frequency: 3000.0,
            rolloff_percent: 90.0,
        };
        let entries = resolve_spectral("flatness,rolloff,noiseness", &params);

        match &entries[0].feature {
            SpectralFeature::Flatness { min_level } => assert_eq!(*min_level, 0.01),
            other => panic!("Expected Flatness, got {:?}", other),
        }
        match &entries[1].feature {
            SpectralFeature::Rolloff { fraction } => assert!((fraction - 0.9).abs() < 1e-6),
            other => panic!("Expected Rolloff, got {:?}", other),
        }
        match &entries[2].feature {
            SpectralFeature::Noiseness { noise_frequency } => assert_eq!(*noise_frequency, 3000.0),
            other => panic!("Expected Noiseness, got {:?}", other),
        }
    }

    #[test]
    fn test_numbered_families() {
        let entries = resolve_spectral("sc2,contrast6,contrast7,contrast", &FeatureParams::default());
        assert_eq!(
            descriptions(&entries),
            vec!["contrast2", "contrast6", "contrast7", "contrast"]
        );
        assert!(matches!(entries[0].feature, SpectralFeature::Contrast { band: 2 }));
        assert_eq!(entries[2].feature.unresolved_token(), Some("contrast7"));
        assert_eq!(entries[3].feature.unresolved_token(), Some("contrast"));

        let harmonic = resolve_harmonic("t1,tristimulus3,t4");
        assert!(matches!(
            harmonic[1].feature,
            HarmonicFeature::Tristimulus { component: 3 }
        ));
        assert_eq!(harmonic[2].feature.unresolved_token(), Some("t4"));
    }

    #[test]
    fn test_unknown_token_is_lazy() {
        let entries = resolve_spectral("centroid,bogus", &FeatureParams::default());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].description, "bogus");

        let spectrum = vec![0.0; 8];
        let freqs = vec![0.0; 8];
        let mut scratch = vec![0.0; 8];
        assert_eq!(
            entries[0].feature.evaluate(&spectrum, &freqs, &mut scratch),
            Ok(0.0)
        );
        assert_eq!(
            entries[1].feature.evaluate(&spectrum, &freqs, &mut scratch),
            Err(PipelineError::UnknownFeature {
                token: "bogus".to_string()
            })
        );
    }

    #[test]
    fn test_custom_routine_dispatch() {
        let routine: SpectralRoutine = Arc::new(|spectrum: &[f32], _: &[f32]| spectrum.len() as f32);
        let feature = SpectralFeature::Custom(routine);
        assert!(feature.is_custom());
        assert_eq!(feature.evaluate(&[1.0; 5], &[0.0; 5], &mut [0.0; 5]), Ok(5.0));
    }
}
