#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthConfig {
    pub min_width: f64,
    pub max_width: f64,
    pub log_factor: f64,
}

impl Default for WidthConfig {
    fn default() -> Self {
        Self {
            min_width: 3.0,
            max_width: 10.0,
            log_factor: 2.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScaleMode {
    Linear,
    Logarithmic,
}

impl ScaleMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Logarithmic => "log",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WidthScaler {
    config: WidthConfig,
    max_instances: usize,
    mode: ScaleMode,
}

impl WidthScaler {
    /// `None` when no edge carries a filtered instance; nothing is left to size.
    pub fn new(max_instances: usize, config: WidthConfig) -> Option<Self> {
        if max_instances == 0 {
            return None;
        }

        let span = config.max_width - config.min_width + 1.0;
        let linear = max_instances as f64 * config.log_factor <= span
            || max_instances < 2
            || config.log_factor <= 1.0;

        Some(Self {
            config,
            max_instances,
            mode: if linear {
                ScaleMode::Linear
            } else {
                ScaleMode::Logarithmic
            },
        })
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn scale(&self, count: usize) -> f64 {
        let WidthConfig {
            min_width,
            max_width,
            log_factor,
        } = self.config;
        let count = count.max(1) as f64;

        match self.mode {
            ScaleMode::Linear => min_width + (count - 1.0) * log_factor,
            ScaleMode::Logarithmic => {
                let ratio = count.log(log_factor) / (self.max_instances as f64).log(log_factor);
                ratio * (max_width - min_width) + min_width
            }
        }
    }
}
