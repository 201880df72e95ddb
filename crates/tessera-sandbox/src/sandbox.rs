use wasmtime::{Engine, ExternType, Linker, Module, Store, Val, ValType};

use crate::config::SandboxConfig;

#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    #[error("WASM engine error: {0}")]
    Engine(#[from] wasmtime::Error),

    #[error("Export not found: {name}")]
    ExportNotFound { name: String },

    #[error("Export '{name}' is not a function")]
    ExportNotFunction { name: String },

    #[error("Export '{name}' does not match operation {operation}: {details}")]
    SignatureMismatch {
        name: String,
        operation: String,
        details: String,
    },

    #[error("Operation {operation} uses type '{type_name}', which has no WASM representation")]
    UnsupportedType {
        operation: String,
        type_name: String,
    },

    #[error("Fuel exhausted during execution")]
    FuelExhausted,
}

/// Store data that implements resource limiting.
pub(crate) struct StoreData {
    memory_limit_bytes: u64,
}

impl wasmtime::ResourceLimiter for StoreData {
    fn memory_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        Ok((desired as u64) <= self.memory_limit_bytes)
    }

    fn table_growing(
        &mut self,
        _current: usize,
        desired: usize,
        _maximum: Option<usize>,
    ) -> anyhow::Result<bool> {
        Ok(desired <= 10_000)
    }
}

/// The WASM sandbox the code under test runs in.
pub struct Sandbox {
    engine: Engine,
    config: SandboxConfig,
}

/// A compiled (but not yet instantiated) module under test.
pub struct LoadedModule {
    module: Module,
}

/// A live instance. Each sequence gets a fresh one, so no state leaks
/// between sequences.
pub struct SandboxInstance {
    store: Store<StoreData>,
    instance: wasmtime::Instance,
    fuel_per_call: Option<u64>,
}

/// Parameter and result types of an exported function.
#[derive(Debug, Clone)]
pub struct ExportSignature {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl Sandbox {
    pub fn new(config: &SandboxConfig) -> Result<Self, SandboxError> {
        let mut engine_config = wasmtime::Config::new();

        if config.fuel_per_call.is_some() {
            engine_config.consume_fuel(true);
        }

        // Pure computation only
        engine_config.wasm_threads(false);

        let engine = Engine::new(&engine_config)?;
        Ok(Self {
            engine,
            config: config.clone(),
        })
    }

    /// Compile and validate a module from bytes.
    pub fn load_module(&self, wasm_bytes: &[u8]) -> Result<LoadedModule, SandboxError> {
        let module = Module::new(&self.engine, wasm_bytes)?;
        Ok(LoadedModule { module })
    }

    /// Instantiate a loaded module with no imports.
    ///
    /// Fails if the module needs imports or its start function traps.
    pub fn instantiate(&self, loaded: &LoadedModule) -> Result<SandboxInstance, SandboxError> {
        let data = StoreData {
            memory_limit_bytes: self.config.memory_limit_bytes,
        };
        let mut store = Store::new(&self.engine, data);
        store.limiter(|data| data);

        let fuel_per_call = self.config.fuel_per_call;
        if let Some(fuel) = fuel_per_call {
            store.set_fuel(fuel)?;
        }

        let linker = Linker::new(&self.engine);
        let instance = linker
            .instantiate(&mut store, &loaded.module)
            .map_err(classify_trap)?;

        Ok(SandboxInstance {
            store,
            instance,
            fuel_per_call,
        })
    }

    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }
}

impl LoadedModule {
    /// Names of all exported functions.
    pub fn function_exports(&self) -> Vec<String> {
        self.module
            .exports()
            .filter(|export| matches!(export.ty(), ExternType::Func(_)))
            .map(|export| export.name().to_string())
            .collect()
    }

    /// Signature of an exported function.
    pub fn export_signature(&self, name: &str) -> Result<ExportSignature, SandboxError> {
        match self.module.get_export(name) {
            Some(ExternType::Func(func_ty)) => Ok(ExportSignature {
                params: func_ty.params().collect(),
                results: func_ty.results().collect(),
            }),
            Some(_) => Err(SandboxError::ExportNotFunction {
                name: name.to_string(),
            }),
            None => Err(SandboxError::ExportNotFound {
                name: name.to_string(),
            }),
        }
    }
}

impl SandboxInstance {
    /// Call an exported function by name. Fuel is reset before each call.
    pub fn call_func(&mut self, name: &str, args: &[Val]) -> Result<Vec<Val>, SandboxError> {
        if let Some(fuel) = self.fuel_per_call {
            self.store.set_fuel(fuel)?;
        }

        let func = self
            .instance
            .get_func(&mut self.store, name)
            .ok_or_else(|| SandboxError::ExportNotFound {
                name: name.to_string(),
            })?;

        let result_count = func.ty(&self.store).results().len();
        let mut results = vec![Val::I32(0); result_count];

        func.call(&mut self.store, args, &mut results)
            .map_err(classify_trap)?;
        Ok(results)
    }

    pub fn remaining_fuel(&self) -> Option<u64> {
        self.store.get_fuel().ok()
    }
}

/// Fuel exhaustion is reported separately from other traps.
fn classify_trap(trap: wasmtime::Error) -> SandboxError {
    let full_msg = format!("{:?}", trap);
    if full_msg.contains("fuel") || full_msg.contains("Fuel") {
        SandboxError::FuelExhausted
    } else {
        SandboxError::Engine(trap)
    }
}
