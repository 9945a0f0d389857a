pub mod energy;
pub mod info;

use crate::error::{CliError, Result};
use tracing::info;

pub(crate) fn configure_thread_pool(num_threads: usize) -> Result<()> {
    info!(
        "Setting Rayon global thread pool to {} threads.",
        num_threads
    );
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to build global thread pool: {}", e)))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::fs;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    const OXYGEN_NETWORK: &str = r#"
        [[layers]]
        activation = "tanh"
        weights = [[0.4, -0.2, 0.3], [0.15, 0.5, -0.1], [-0.3, 0.2, 0.25]]
        bias = [0.0, 0.1, -0.05]

        [[layers]]
        activation = "linear"
        weights = [[1.0, -0.7, 0.4]]
        bias = [0.2]
    "#;

    const HYDROGEN_NETWORK: &str = r#"
        [[layers]]
        activation = "sigmoid"
        weights = [[0.3, -0.3], [0.6, 0.1]]
        bias = [0.0, -0.2]

        [[layers]]
        activation = "linear"
        weights = [[0.5, -0.25]]
        bias = [0.0]
    "#;

    const MANIFEST: &str = r#"
        topology = "2h2o"
        energy-unit = 2.0

        [species.O]
        network = "O.toml"
        scaling = "O.csv"
        radial = [
            { neighbor = "O", cutoff = 6.0, eta = 0.1, shift = 2.5 },
            { neighbor = "H", cutoff = 6.0, eta = 0.5 },
        ]
        angular = [
            { neighbors = ["H", "H"], cutoff = 6.0, eta = 0.01, zeta = 2.0, lambda = -1.0 },
        ]

        [species.H]
        network = "H.toml"
        radial = [
            { neighbor = "O", cutoff = 6.0, eta = 0.2 },
            { neighbor = "H", cutoff = 6.0, eta = 0.2 },
        ]
    "#;

    /// Two dimer frames: O–O at 3.0 Å (fully switched on) and at 7.0 Å
    /// (beyond the switch, contributes nothing).
    pub const DIMERS: &str = "\
6
close
O    0.000  0.000  0.000
H    0.757  0.586  0.000
H   -0.757  0.586  0.000
O    3.000  0.000  0.000
H    3.300 -0.200  0.900
H    3.250 -0.850 -0.380
6
far
O    0.000  0.000  0.000
H    0.757  0.586  0.000
H   -0.757  0.586  0.000
O    7.000  0.000  0.000
H    7.300 -0.200  0.900
H    7.250 -0.850 -0.380
";

    /// A directory holding `model.toml` with its network and scaling files,
    /// plus `dimers.xyz`.
    pub fn write_model() -> (TempDir, PathBuf, PathBuf) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("O.toml"), OXYGEN_NETWORK).unwrap();
        fs::write(dir.path().join("H.toml"), HYDROGEN_NETWORK).unwrap();
        fs::write(dir.path().join("O.csv"), "min,max\n0.0,2.0\n0.0,4.0\n0.0,0.5\n").unwrap();
        let model = dir.path().join("model.toml");
        fs::write(&model, MANIFEST).unwrap();
        let input = dir.path().join("dimers.xyz");
        fs::write(&input, DIMERS).unwrap();
        (dir, model, input)
    }
}
