//! Test data builders for creating test objects

use faderlink::Config;

/// Builder for configuration snapshots
pub struct ConfigBuilder {
    port: String,
    baud_rate: u32,
    noise_reduction: &'static str,
    invert_sliders: bool,
    button_mapping: Vec<(usize, Vec<&'static str>)>,
}

impl ConfigBuilder {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: 9600,
            noise_reduction: "default",
            invert_sliders: false,
            button_mapping: Vec::new(),
        }
    }

    pub fn baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn noise_reduction(mut self, level: &'static str) -> Self {
        self.noise_reduction = level;
        self
    }

    pub fn invert_sliders(mut self, invert: bool) -> Self {
        self.invert_sliders = invert;
        self
    }

    pub fn button(mut self, index: usize, tokens: &[&'static str]) -> Self {
        self.button_mapping.push((index, tokens.to_vec()));
        self
    }

    pub fn to_toml(&self) -> String {
        let mut out = format!(
            "invert_sliders = {}\nnoise_reduction = \"{}\"\n\n\
             [connection]\nport = \"{}\"\nbaud_rate = {}\n\n\
             [button_mapping]\n",
            self.invert_sliders, self.noise_reduction, self.port, self.baud_rate
        );
        for (index, tokens) in &self.button_mapping {
            let tokens: Vec<String> = tokens.iter().map(|t| format!("\"{}\"", t)).collect();
            out.push_str(&format!("{} = [{}]\n", index, tokens.join(", ")));
        }
        out
    }

    pub fn build(self) -> Config {
        Config::from_toml_str(&self.to_toml()).expect("builder produces valid config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new("COM3")
            .baud_rate(115200)
            .noise_reduction("low")
            .button(1, &["CTRL", "VK_BROWSER_BACK"])
            .build();

        assert_eq!(config.connection.port, "COM3");
        assert_eq!(config.connection.baud_rate, 115200);
        assert_eq!(config.button_mapping()[&1].len(), 2);
    }
}
