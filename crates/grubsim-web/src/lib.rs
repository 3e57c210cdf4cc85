#![cfg(target_arch = "wasm32")]

use anyhow::{Result, ensure};
use grubsim_core::{Bounds, EcosystemConfig, World, WorldSnapshot};
use js_sys::Uint8Array;
use postcard::to_allocvec;
use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct SimHandle {
    world: World,
    spec: SimSpec,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
enum SnapshotFormat {
    #[default]
    Json,
    Binary,
}

#[derive(Clone)]
struct SimSpec {
    base_config: EcosystemConfig,
    seed: Option<u64>,
    snapshot_format: SnapshotFormat,
}

impl SimSpec {
    fn with_seed(&self, seed: Option<u64>) -> Self {
        Self {
            seed,
            ..self.clone()
        }
    }

    /// Browser builds have no OS entropy; draw a seed from `Math.random` instead.
    fn config(&self) -> EcosystemConfig {
        let mut config = self.base_config.clone();
        config.rng_seed = Some(self.seed.unwrap_or_else(random_seed));
        config
    }

    fn build_world(&self) -> Result<World> {
        Ok(World::populated(self.config())?)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
struct InitOptions {
    seed: Option<u64>,
    width: Option<f32>,
    height: Option<f32>,
    speed_factor: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    config: Option<EcosystemConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    snapshot_format: Option<SnapshotFormat>,
}

impl InitOptions {
    fn into_spec(self) -> SimSpec {
        let mut config = self.config.unwrap_or_default();
        if let Some(width) = self.width {
            config.world_width = width;
        }
        if let Some(height) = self.height {
            config.world_height = height;
        }
        if let Some(speed) = self.speed_factor {
            config.speed_factor = speed;
        }
        SimSpec {
            base_config: config,
            seed: self.seed,
            snapshot_format: self.snapshot_format.unwrap_or_default(),
        }
    }
}

#[wasm_bindgen]
impl SimHandle {
    /// Run one animation frame (`speedFactor` ticks) and return the snapshot to draw.
    #[wasm_bindgen(js_name = frame)]
    pub fn frame_js(&mut self) -> Result<JsValue, JsValue> {
        self.world.run_frame();
        self.encode_snapshot()
    }

    /// Run exactly `steps` ticks regardless of the speed factor.
    #[wasm_bindgen(js_name = tick)]
    pub fn tick_js(&mut self, steps: u32) -> Result<JsValue, JsValue> {
        for _ in 0..steps {
            self.world.tick();
        }
        self.encode_snapshot()
    }

    #[wasm_bindgen(js_name = snapshot)]
    pub fn snapshot_js(&self) -> Result<JsValue, JsValue> {
        self.encode_snapshot()
    }

    /// Population counts and elapsed ticks for the status line.
    #[wasm_bindgen(js_name = population)]
    pub fn population_js(&self) -> Result<JsValue, JsValue> {
        to_value(&self.world.population()).map_err(js_error)
    }

    #[wasm_bindgen(js_name = setSpeedFactor)]
    pub fn set_speed_factor_js(&mut self, speed_factor: u32) {
        self.world.set_speed_factor(speed_factor);
    }

    #[wasm_bindgen(js_name = speedFactor)]
    pub fn speed_factor_js(&self) -> u32 {
        self.world.speed_factor()
    }

    /// Follow a canvas resize; agents wrap against the new extent from the next tick.
    #[wasm_bindgen(js_name = resize)]
    pub fn resize_js(&mut self, width: f32, height: f32) -> Result<(), JsValue> {
        self.world
            .set_bounds(Bounds::new(width, height))
            .map_err(js_error)
    }

    /// Rebuild the world, keeping the speed factor the page last selected.
    #[wasm_bindgen(js_name = reset)]
    pub fn reset_js(&mut self, seed: Option<f64>) -> Result<(), JsValue> {
        let seed = normalize_seed(seed).map_err(js_error)?;
        let spec = self.spec.with_seed(seed);
        let mut world = spec.build_world().map_err(js_error)?;
        world.set_speed_factor(self.world.speed_factor());
        world
            .set_bounds(self.world.bounds())
            .map_err(js_error)?;
        self.world = world;
        self.spec = spec;
        Ok(())
    }
}

impl SimHandle {
    fn encode_snapshot(&self) -> Result<JsValue, JsValue> {
        encode_snapshot(&self.world.snapshot(), self.spec.snapshot_format)
    }
}

#[wasm_bindgen]
pub fn init_sim(options: JsValue) -> Result<SimHandle, JsValue> {
    let options = if options.is_null() || options.is_undefined() {
        InitOptions::default()
    } else {
        from_value::<InitOptions>(options).map_err(js_error)?
    };

    let spec = options.into_spec();
    let world = spec.build_world().map_err(js_error)?;
    Ok(SimHandle { world, spec })
}

fn random_seed() -> u64 {
    (js_sys::Math::random() * u32::MAX as f64) as u64
}

/// JS numbers arrive as `f64`; accept any non-negative whole part that fits a `u64`.
fn normalize_seed(seed: Option<f64>) -> Result<Option<u64>> {
    seed.map(|raw| -> Result<u64> {
        let whole = raw.trunc();
        ensure!(
            raw.is_finite() && whole >= 0.0 && whole < u64::MAX as f64,
            "reset seed {raw} is not a non-negative integer in u64 range"
        );
        Ok(whole as u64)
    })
    .transpose()
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsError::new(&err.to_string()).into()
}

fn encode_snapshot(snapshot: &WorldSnapshot, format: SnapshotFormat) -> Result<JsValue, JsValue> {
    match format {
        SnapshotFormat::Json => to_value(snapshot).map_err(js_error),
        SnapshotFormat::Binary => {
            let bytes = to_allocvec(snapshot).map_err(js_error)?;
            Ok(Uint8Array::from(bytes.as_slice()).into())
        }
    }
}

#[wasm_bindgen]
pub fn version() -> String {
    format!("grubsim-web {}", env!("CARGO_PKG_VERSION"))
}

#[wasm_bindgen]
pub fn default_init_options() -> Result<JsValue, JsValue> {
    to_value(&InitOptions::default()).map_err(js_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn handle_matches_native_world() {
        let spec = InitOptions {
            seed: Some(8102),
            width: Some(480.0),
            height: Some(360.0),
            speed_factor: Some(3),
            ..InitOptions::default()
        }
        .into_spec();

        let mut native = World::populated(spec.config()).expect("native world");
        let mut handle = SimHandle {
            world: spec.build_world().expect("handle world"),
            spec,
        };

        for _ in 0..10 {
            native.run_frame();
            handle.world.run_frame();
        }
        assert_eq!(native.snapshot(), handle.world.snapshot());
        assert_eq!(handle.world.tick_count().0, 30);
    }

    #[wasm_bindgen_test]
    fn seeds_are_validated() {
        assert!(normalize_seed(Some(-1.0)).is_err());
        assert!(normalize_seed(Some(f64::NAN)).is_err());
        assert_eq!(normalize_seed(Some(42.9)).expect("seed"), Some(42));
        assert!(normalize_seed(Some(f64::INFINITY)).is_err());
        assert_eq!(normalize_seed(None).expect("none"), None);
    }
}
