//! Browser runtime: the bootstrap module and the chunk file format.
//!
//! A chunk file pushes `[[name], {id: factory}, [entry ids]]` onto
//! `self.kilnChunks`. The bootstrap drains that queue, keeps the module
//! registry and provides `__kiln_require__` with its helpers:
//!
//! - `.d(m)` default-export interop
//! - `.e(exports, getters)` ES export getters
//! - `.r(exports, from)` `export *` re-export
//! - `.s(css, id)` style injection
//! - `.l(id)` lazy load, fetching the owning chunk file when needed

use std::collections::BTreeMap;

use kiln_graph::ModuleId;
use rustc_hash::FxHashMap;

use crate::chunks::{Chunk, RUNTIME_MODULE};
use crate::transform::{TransformedUnit, js_string};

const BOOTSTRAP: &str = r#"(function () {
  var registry = {};
  var cache = {};
  var chunkFiles = __KILN_CHUNK_FILES__;
  var pending = {};

  function __kiln_require__(id) {
    var cached = cache[id];
    if (cached) return cached.exports;
    var factory = registry[id];
    if (!factory) throw new Error("kiln: module not found: " + id);
    var module = (cache[id] = { exports: {} });
    factory.call(module.exports, module, module.exports, __kiln_require__);
    return module.exports;
  }

  __kiln_require__.d = function (m) {
    return m && m.__esModule ? m["default"] : m;
  };

  __kiln_require__.e = function (exports, getters) {
    Object.defineProperty(exports, "__esModule", { value: true });
    Object.keys(getters).forEach(function (key) {
      Object.defineProperty(exports, key, { enumerable: true, get: getters[key] });
    });
  };

  __kiln_require__.r = function (exports, from) {
    Object.keys(from).forEach(function (key) {
      if (key === "default" || Object.prototype.hasOwnProperty.call(exports, key)) return;
      Object.defineProperty(exports, key, {
        enumerable: true,
        get: function () { return from[key]; }
      });
    });
  };

  __kiln_require__.s = function (css, id) {
    var style = document.createElement("style");
    style.setAttribute("data-kiln-module", id);
    style.textContent = css;
    document.head.appendChild(style);
  };

  __kiln_require__.l = function (id) {
    if (registry[id]) {
      return Promise.resolve().then(function () { return __kiln_require__(id); });
    }
    var file = chunkFiles[id];
    if (!file) return Promise.reject(new Error("kiln: no chunk provides " + id));
    if (!pending[file]) {
      pending[file] = new Promise(function (resolve, reject) {
        var script = document.createElement("script");
        script.src = file;
        script.onload = resolve;
        script.onerror = function () { reject(new Error("kiln: failed to load " + file)); };
        document.head.appendChild(script);
      });
    }
    return pending[file].then(function () { return __kiln_require__(id); });
  };

  function install(chunk) {
    var modules = chunk[1];
    Object.keys(modules).forEach(function (id) { registry[id] = modules[id]; });
    (chunk[2] || []).forEach(function (id) { __kiln_require__(id); });
  }

  var queue = (self.kilnChunks = self.kilnChunks || []);
  queue.forEach(install);
  queue.push = function (chunk) {
    install(chunk);
    return Array.prototype.push.call(queue, chunk);
  };
})();
"#;

/// The bootstrap source. `chunk_files` maps the targets of dynamic imports
/// to the URL of the chunk file that registers them.
pub fn bootstrap(chunk_files: &BTreeMap<String, String>) -> String {
    let map: serde_json::Map<String, serde_json::Value> = chunk_files
        .iter()
        .map(|(id, url)| (id.clone(), serde_json::Value::from(url.as_str())))
        .collect();
    BOOTSTRAP.replace(
        "__KILN_CHUNK_FILES__",
        &serde_json::Value::Object(map).to_string(),
    )
}

/// Render one chunk file.
///
/// `entry` is executed once the chunk is installed. A chunk that owns the
/// bootstrap module gets the bootstrap inlined ahead of its payload.
pub fn render_chunk(
    chunk: &Chunk,
    units: &FxHashMap<ModuleId, TransformedUnit>,
    entry: Option<&ModuleId>,
    bootstrap_source: &str,
) -> String {
    let mut out = String::new();
    if chunk.has_runtime() {
        out.push_str(bootstrap_source);
    }

    let members: Vec<&TransformedUnit> = chunk
        .modules
        .iter()
        .filter(|id| id.as_str() != RUNTIME_MODULE)
        .filter_map(|id| units.get(id))
        .collect();
    if members.is_empty() && entry.is_none() {
        return out;
    }

    out.push_str(&format!(
        "(self.kilnChunks = self.kilnChunks || []).push([[{}], {{\n",
        js_string(&chunk.name)
    ));
    for (index, unit) in members.iter().enumerate() {
        let separator = if index + 1 < members.len() { "," } else { "" };
        let body = unit.code.trim_end();
        out.push_str(&format!(
            "{}: function (module, exports, __kiln_require__) {{\n{body}\n}}{separator}\n",
            js_string(unit.id.as_str())
        ));
    }
    out.push('}');
    if let Some(entry) = entry {
        out.push_str(&format!(", [{}]", js_string(entry.as_str())));
    }
    out.push_str("]);\n");
    out
}
