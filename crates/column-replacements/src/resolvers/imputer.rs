//! Replacement of missing values by statistical imputation.

use super::ColumnContext;
use crate::config::{ImputerAlgorithm, ImputerConfig};
use crate::error::{Result, ResultExt};
use crate::imputers::{ColumnImputer, IterativeImputer, KNNImputer, StatisticalImputer};
use polars::prelude::*;
use tracing::debug;

/// Instantiate the imputer described by an algorithm configuration.
pub fn create_imputer(algorithm: &ImputerAlgorithm) -> Box<dyn ColumnImputer> {
    match algorithm {
        ImputerAlgorithm::Iterative { max_iter, tol } => {
            Box::new(IterativeImputer::new(*max_iter, *tol))
        }
        ImputerAlgorithm::Knn { n_neighbors } => Box::new(KNNImputer::new(*n_neighbors)),
        ImputerAlgorithm::Simple {
            strategy,
            fill_value,
        } => Box::new(StatisticalImputer::new(*strategy, *fill_value)),
    }
}

/// Fill the column's missing values. Observed values are left as they are
/// and the result is always `Float64`.
pub fn build_column(cfg: &ImputerConfig, ctx: &ColumnContext<'_>) -> Result<Series> {
    let features = cfg
        .features
        .iter()
        .filter(|name| name.as_str() != ctx.column())
        .map(|name| ctx.other_column(name))
        .collect::<Result<Vec<_>>>()?;

    let imputer = create_imputer(&cfg.algorithm);
    debug!(
        "Imputing '{}' with {} ({} predictor columns)",
        ctx.column(),
        imputer.name(),
        features.len()
    );

    let mut imputed = imputer
        .impute(&ctx.series, &features)
        .context(format!("{} imputation of '{}'", imputer.name(), ctx.column()))?;
    imputed.rename(ctx.output_name.into());
    Ok(imputed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_KNN_NEIGHBORS, SimpleStrategy};
    use crate::resolvers::test_support::{f64_values, replacements_data};
    use pretty_assertions::assert_eq;

    fn run(cfg: &ImputerConfig, column: &str) -> Result<Series> {
        let df = replacements_data();
        let ctx = ColumnContext::new(&df, "1", column, "imputed")?;
        build_column(cfg, &ctx)
    }

    fn assert_middle_filled(out: &Series) {
        let values = f64_values(out);
        assert_eq!(out.name().as_str(), "imputed");
        assert_eq!(values[0], Some(1.1));
        assert!((values[1].unwrap() - 2.05).abs() < 1e-9);
        assert_eq!(values[2], Some(3.0));
    }

    #[test]
    fn test_iterative() {
        let cfg = ImputerConfig::new(ImputerAlgorithm::Iterative {
            max_iter: 10,
            tol: 1e-3,
        });
        assert_middle_filled(&run(&cfg, "d").unwrap());
    }

    #[test]
    fn test_knn() {
        let cfg = ImputerConfig::new(ImputerAlgorithm::Knn {
            n_neighbors: DEFAULT_KNN_NEIGHBORS,
        });
        assert_middle_filled(&run(&cfg, "d").unwrap());
    }

    #[test]
    fn test_simple() {
        let cfg = ImputerConfig::new(ImputerAlgorithm::Simple {
            strategy: SimpleStrategy::Mean,
            fill_value: 0.0,
        });
        assert_middle_filled(&run(&cfg, "d").unwrap());
    }

    #[test]
    fn test_string_column_is_type_error() {
        let cfg = ImputerConfig::new(ImputerAlgorithm::Knn { n_neighbors: 2 });
        let err = run(&cfg, "e").unwrap_err();
        assert_eq!(err.error_code(), "TYPE_MISMATCH");
    }

    #[test]
    fn test_unknown_feature_column() {
        let cfg = ImputerConfig::new(ImputerAlgorithm::Knn { n_neighbors: 2 })
            .features(vec!["missing".to_string()]);
        let err = run(&cfg, "d").unwrap_err();
        assert!(err.is_lookup());
    }

    #[test]
    fn test_target_is_not_its_own_feature() {
        let df = df![
            "x" => [1.0, 2.0, 3.0, 4.0],
            "y" => [Some(2.0), Some(4.0), None, Some(8.0)],
        ]
        .unwrap();
        let cfg = ImputerConfig::new(ImputerAlgorithm::Iterative {
            max_iter: 10,
            tol: 1e-3,
        })
        .features(vec!["y".to_string(), "x".to_string()]);
        let ctx = ColumnContext::new(&df, "1", "y", "y").unwrap();

        let out = build_column(&cfg, &ctx).unwrap();
        assert!((f64_values(&out)[2].unwrap() - 6.0).abs() < 0.01);
    }
}
