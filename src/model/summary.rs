use std::fmt::{self, Display, Formatter};

use super::network::Topology;

const RULE_WIDTH: usize = 65;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerRow {
    pub name: String,
    pub kind: &'static str,
    pub output_width: usize,
    pub params: usize,
}

/// Layer table in the familiar `Model.summary()` layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSummary {
    pub rows: Vec<LayerRow>,
}

impl ModelSummary {
    pub fn of(topology: &Topology) -> Self {
        let dense = |name: &str, fan_in: usize, fan_out: usize| LayerRow {
            name: name.to_string(),
            kind: "Dense",
            output_width: fan_out,
            params: (fan_in + 1) * fan_out,
        };
        let activation = |name: &str, width: usize| LayerRow {
            name: name.to_string(),
            kind: "Activation",
            output_width: width,
            params: 0,
        };
        Self {
            rows: vec![
                dense("dense", topology.input_dim, topology.hidden_units),
                activation("activation", topology.hidden_units),
                dense("dense_1", topology.hidden_units, topology.output_dim),
                activation("activation_1", topology.output_dim),
            ],
        }
    }

    pub fn total_params(&self) -> usize {
        self.rows.iter().map(|row| row.params).sum()
    }
}

impl Display for ModelSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Model: \"sequential\"")?;
        writeln!(f, "{}", "_".repeat(RULE_WIDTH))?;
        writeln!(f, "{:<29}{:<26}{:<10}", "Layer (type)", "Output Shape", "Param #")?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        for row in &self.rows {
            let label = format!("{} ({})", row.name, row.kind);
            let shape = format!("(None, {})", row.output_width);
            writeln!(f, "{:<29}{:<26}{:<10}", label, shape, row.params)?;
        }
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        writeln!(f, "Total params: {}", self.total_params())?;
        writeln!(f, "Trainable params: {}", self.total_params())?;
        write!(f, "Non-trainable params: 0")
    }
}
