//! Module body execution through the public engine API.

use bramble_script::{Engine, Error, Host, ModuleBindings, ObjectRef, Result, Value};
use std::collections::HashMap;

/// Serves `require` from a fixed table of export objects.
struct TableHost {
    modules: HashMap<String, ObjectRef>,
    requested: Vec<(String, String)>,
}

impl Host for TableHost {
    fn require(&mut self, owner: &str, specifier: &str) -> Result<Value> {
        self.requested.push((owner.to_string(), specifier.to_string()));
        self.modules
            .get(specifier)
            .cloned()
            .map(Value::Object)
            .ok_or_else(|| Error::type_error(format!("Cannot find module '{}'", specifier)))
    }
}

fn module_bindings(filename: &str) -> (ObjectRef, ObjectRef, ModuleBindings) {
    let exports = ObjectRef::new();
    let module = ObjectRef::from_entries([("exports", Value::Object(exports.clone()))]);
    let bindings = ModuleBindings {
        exports: Value::Object(exports.clone()),
        module: Value::Object(module.clone()),
        filename: filename.to_string(),
        dirname: "/app".to_string(),
    };
    (exports, module, bindings)
}

#[test]
fn test_require_and_reexport() {
    let dep = ObjectRef::from_entries([("x", Value::Number(1.0))]);
    let mut host = TableHost {
        modules: HashMap::from([("./dep".to_string(), dep)]),
        requested: Vec::new(),
    };

    let engine = Engine::new();
    let unit = engine
        .compile(
            "const dep = require('./dep')\nexports.y = dep.x + 1\nexports.same = dep === require('./dep')",
            "/app/main.js",
        )
        .unwrap();
    let (exports, _, bindings) = module_bindings("/app/main.js");
    unit.invoke(bindings, &mut host).unwrap();

    assert_eq!(exports.get("y"), Some(Value::Number(2.0)));
    assert_eq!(exports.get("same"), Some(Value::Boolean(true)));
    let from_main = ("/app/main.js".to_string(), "./dep".to_string());
    assert_eq!(host.requested, vec![from_main.clone(), from_main]);
}

#[test]
fn test_module_exports_replacement() {
    let engine = Engine::new();
    let unit = engine
        .compile("module.exports = { kind: 'replaced' }", "/app/r.js")
        .unwrap();
    let (exports, module, bindings) = module_bindings("/app/r.js");
    let mut host = TableHost {
        modules: HashMap::new(),
        requested: Vec::new(),
    };
    unit.invoke(bindings, &mut host).unwrap();

    assert!(exports.is_empty());
    assert_eq!(module.get("exports").unwrap().get("kind"), Value::from("replaced"));
}

#[test]
fn test_failed_require_propagates() {
    let engine = Engine::new();
    let unit = engine.compile("require('missing')", "/app/m.js").unwrap();
    let (_, _, bindings) = module_bindings("/app/m.js");
    let mut host = TableHost {
        modules: HashMap::new(),
        requested: Vec::new(),
    };
    let err = unit.invoke(bindings, &mut host).unwrap_err();
    assert_eq!(err.to_string(), "TypeError: Cannot find module 'missing'");
}

#[test]
fn test_exported_require_keeps_its_owner() {
    let engine = Engine::new();
    let lib = engine.compile("exports.req = require", "/app/lib/a.js").unwrap();
    let (lib_exports, _, lib_bindings) = module_bindings("/app/lib/a.js");
    let mut host = TableHost {
        modules: HashMap::from([("./b".to_string(), ObjectRef::new())]),
        requested: Vec::new(),
    };
    lib.invoke(lib_bindings, &mut host).unwrap();

    let main = engine.compile("lib.req('./b')", "/app/main.js").unwrap();
    engine.globals().set("lib", Value::Object(lib_exports));
    let (_, _, main_bindings) = module_bindings("/app/main.js");
    main.invoke(main_bindings, &mut host).unwrap();

    assert_eq!(
        host.requested,
        vec![("/app/lib/a.js".to_string(), "./b".to_string())]
    );
}
