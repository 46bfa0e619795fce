use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use shared::{
    geojson::SourceData,
    surface::{LayerSpec, MapOptions, MapSurface, SurfaceError},
};
use wasm_bindgen::prelude::{JsValue, wasm_bindgen};

#[wasm_bindgen(module = "/mapbox_map.js")]
extern "C" {
    #[wasm_bindgen(js_name = createMap, catch)]
    fn create_map(container: &str, options: JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(js_name = hasLayer)]
    fn has_layer_js(id: &str) -> bool;
    #[wasm_bindgen(js_name = addLayer, catch)]
    fn add_layer_js(layer: JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(js_name = setSourceData, catch)]
    fn set_source_data_js(id: &str, data: JsValue) -> Result<(), JsValue>;
    #[wasm_bindgen(js_name = removeMap)]
    fn remove_map();
}

/// `MapSurface` backed by the mapbox-gl map living in `mapbox_map.js`.
///
/// The script dispatches `map-load`, `map-click` and `map-error` window
/// events; the app turns them into panel calls.
pub struct JsSurface {
    removed: bool,
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, SurfaceError> {
    // plain objects rather than JS `Map`s, mapbox only reads the former
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| SurfaceError::Backend(err.to_string()))
}

fn backend_error(err: JsValue) -> SurfaceError {
    SurfaceError::Backend(err.as_string().unwrap_or_else(|| format!("{err:?}")))
}

impl MapSurface for JsSurface {
    fn create(container: &str, options: &MapOptions) -> Result<Self, SurfaceError> {
        let options = to_js(options)?;
        create_map(container, options)
            .map_err(|err| SurfaceError::Init(err.as_string().unwrap_or_else(|| format!("{err:?}"))))?;
        Ok(Self { removed: false })
    }

    fn has_layer(&self, id: &str) -> bool {
        !self.removed && has_layer_js(id)
    }

    fn add_layer(&mut self, layer: LayerSpec) -> Result<(), SurfaceError> {
        if self.removed {
            return Err(SurfaceError::Removed);
        }
        add_layer_js(to_js(&layer)?).map_err(backend_error)
    }

    fn set_source_data(&mut self, id: &str, data: SourceData) -> Result<(), SurfaceError> {
        if self.removed {
            return Err(SurfaceError::Removed);
        }
        set_source_data_js(id, to_js(&data)?).map_err(backend_error)
    }

    fn remove(&mut self) {
        if !self.removed {
            self.removed = true;
            remove_map();
        }
    }

    fn is_removed(&self) -> bool {
        self.removed
    }
}
