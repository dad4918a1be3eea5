//! The converter registry, a two-phase store of converters keyed by shape.
//!
//! Configuration happens on a [`RegistryBuilder`]: product and enum type
//! definitions, custom converters, and policy switches are installed there,
//! then [`RegistryBuilder::seal`] produces the runtime [`Registry`]. The
//! split is enforced by the type system: a builder cannot perform lookups
//! and a sealed registry cannot be mutated, so the illegal phase
//! transitions are unrepresentable rather than checked at runtime.
//!
//! ## Lookup
//!
//! For a concrete shape and capability, in order: the cache; explicitly
//! installed custom converters, scanned in reverse registration order so the
//! later registration wins; built-in shapes dispatched by variant tag; and
//! finally on-demand synthesis for registered product and enum types.
//! Anything else is a [`ConfigError::NotRegistered`].
//!
//! ## Self-referential types
//!
//! Product synthesis reserves an arena slot and caches a forward reference
//! to it *before* introspecting the type's components. A component whose
//! type resolves back to the product (directly or transitively) then picks
//! up the slot index instead of recursing forever. Slot indices are only
//! dereferenced while converting values, by which time the slot has been
//! bound; an unbound dereference signals a registry bug, never bad input.
//!
//! ## Concurrency
//!
//! After sealing, lookups may race from multiple threads. The cache and
//! arena locks are only held long enough to read or insert one entry; the
//! synthesis mutex, by contrast, is held for a whole graph build, so that
//! a recursive component lookup never re-acquires it. A thread whose cache
//! hit is a still-unbound forward reference waits on that mutex and
//! retries; the wait ends exactly when the synthesizing thread has bound
//! the slot (or unwound its entries on failure). Entries are never
//! evicted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::Value;

use crate::convert::{
    scalar_converter, Capability, Converter, EnumConverter, FieldPlan, ListConverter,
    MapConverter, NullableConverter, OptionalConverter, ProductConverter,
};
use crate::datum::Datum;
use crate::error::{ConfigError, DecodeError, EncodeError};
use crate::report::ErrorTree;
use crate::resolve;
use crate::shape::{Bundle, EnumDef, ProductDef, Shape};

// ---------------------------------------------------------------------------
// Converter references
// ---------------------------------------------------------------------------

/// A reference to a converter held by the registry: either the converter
/// itself, or an index into the synthesis arena for types that may be
/// self-referential.
#[derive(Clone)]
pub(crate) enum ConverterRef {
    Direct(Arc<dyn Converter>),
    Slot(usize),
}

impl ConverterRef {
    fn get(&self, registry: &Registry) -> Result<Arc<dyn Converter>, ConfigError> {
        match self {
            ConverterRef::Direct(conv) => Ok(conv.clone()),
            ConverterRef::Slot(index) => registry
                .arena_read()
                .get(*index)
                .and_then(Clone::clone)
                .ok_or(ConfigError::UnboundForwardRef { index: *index }),
        }
    }
}

/// Both capability halves for one component shape, resolved at synthesis
/// time and dereferenced only while converting.
pub(crate) struct ConvPair {
    decode: ConverterRef,
    encode: ConverterRef,
}

impl ConvPair {
    pub(crate) fn decoder(&self, registry: &Registry) -> Result<Arc<dyn Converter>, ErrorTree> {
        self.decode.get(registry).map_err(ErrorTree::internal)
    }

    pub(crate) fn encoder(&self, registry: &Registry) -> Result<Arc<dyn Converter>, ErrorTree> {
        self.encode.get(registry).map_err(ErrorTree::internal)
    }
}

// ---------------------------------------------------------------------------
// Builder (configuration phase)
// ---------------------------------------------------------------------------

/// The configuration phase of a registry. Install type definitions and
/// converters here, then [`seal`](Self::seal).
#[derive(Default)]
pub struct RegistryBuilder {
    custom: Vec<Arc<dyn Converter>>,
    products: HashMap<String, ProductDef>,
    enums: HashMap<String, EnumDef>,
    ignore_unknown: bool,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product (record) type definition.
    pub fn product(mut self, def: ProductDef) -> Result<Self, ConfigError> {
        if self.products.contains_key(&def.name) || self.enums.contains_key(&def.name) {
            return Err(ConfigError::DuplicateType { name: def.name });
        }
        self.products.insert(def.name.clone(), def);
        Ok(self)
    }

    /// Register an enum type definition.
    pub fn enumeration(mut self, def: EnumDef) -> Result<Self, ConfigError> {
        if self.products.contains_key(&def.name) || self.enums.contains_key(&def.name) {
            return Err(ConfigError::DuplicateType { name: def.name });
        }
        self.enums.insert(def.name.clone(), def);
        Ok(self)
    }

    /// Register every type definition from a bundle.
    pub fn bundle(mut self, bundle: &Bundle) -> Result<Self, ConfigError> {
        for def in &bundle.products {
            self = self.product(def.clone())?;
        }
        for def in &bundle.enums {
            self = self.enumeration(def.clone())?;
        }
        Ok(self)
    }

    /// Install a custom converter. Later registrations take precedence when
    /// several claim the same shape.
    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.custom.push(converter);
        self
    }

    /// Tolerate JSON object keys that match no declared component instead of
    /// reporting them as errors. Off by default.
    pub fn ignore_unknown_properties(mut self, ignore: bool) -> Self {
        self.ignore_unknown = ignore;
        self
    }

    /// End the configuration phase. Irreversible: the builder is consumed
    /// and the returned registry only answers lookups.
    pub fn seal(self) -> Registry {
        tracing::debug!(
            products = self.products.len(),
            enums = self.enums.len(),
            custom = self.custom.len(),
            "sealing converter registry"
        );
        Registry {
            custom: self.custom,
            products: self.products,
            enums: self.enums,
            ignore_unknown: self.ignore_unknown,
            cache: RwLock::new(HashMap::new()),
            arena: RwLock::new(Vec::new()),
            synthesis: Mutex::new(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Registry (sealed phase)
// ---------------------------------------------------------------------------

/// The sealed, lookup-only registry. Process-scoped; share by reference.
pub struct Registry {
    custom: Vec<Arc<dyn Converter>>,
    products: HashMap<String, ProductDef>,
    enums: HashMap<String, EnumDef>,
    ignore_unknown: bool,
    cache: RwLock<HashMap<(Shape, Capability), ConverterRef>>,
    arena: RwLock<Vec<Option<Arc<dyn Converter>>>>,
    /// Serializes whole-graph synthesis so a racing thread cannot observe a
    /// cached forward reference whose slot another thread is still filling.
    /// Lookups that hit the cache never touch this.
    synthesis: Mutex<()>,
}

impl Registry {
    // Lock poisoning means another thread panicked mid-conversion; the data
    // under these locks is still structurally sound (inserts are atomic per
    // guard), so recover the guard instead of propagating the panic.
    fn cache_read(&self) -> RwLockReadGuard<'_, HashMap<(Shape, Capability), ConverterRef>> {
        self.cache.read().unwrap_or_else(|e| e.into_inner())
    }

    fn cache_write(&self) -> RwLockWriteGuard<'_, HashMap<(Shape, Capability), ConverterRef>> {
        self.cache.write().unwrap_or_else(|e| e.into_inner())
    }

    fn arena_read(&self) -> RwLockReadGuard<'_, Vec<Option<Arc<dyn Converter>>>> {
        self.arena.read().unwrap_or_else(|e| e.into_inner())
    }

    fn arena_write(&self) -> RwLockWriteGuard<'_, Vec<Option<Arc<dyn Converter>>>> {
        self.arena.write().unwrap_or_else(|e| e.into_inner())
    }

    fn synthesis_guard(&self) -> MutexGuard<'_, ()> {
        self.synthesis.lock().unwrap_or_else(|e| e.into_inner())
    }

    // -----------------------------------------------------------------------
    // Façade
    // -----------------------------------------------------------------------

    /// Decode a JSON value into a typed value of the given shape.
    ///
    /// Validation problems come back as [`DecodeError::Invalid`] carrying
    /// the complete multi-field error tree; a shape the registry cannot
    /// convert at all is a [`ConfigError`].
    pub fn decode(&self, value: &Value, shape: &Shape) -> Result<Datum, DecodeError> {
        let conv = self.converter(shape, Capability::Decode)?;
        conv.decode(value, shape, self).map_err(DecodeError::Invalid)
    }

    /// Encode a typed value of the given shape into a JSON value.
    pub fn encode(&self, datum: &Datum, shape: &Shape) -> Result<Value, EncodeError> {
        let conv = self.converter(shape, Capability::Encode)?;
        conv.encode(datum, shape, self).map_err(EncodeError::Invalid)
    }

    /// Whether a decode converter can be produced for the shape.
    pub fn supports_decode(&self, shape: &Shape) -> bool {
        self.lookup(shape, Capability::Decode).is_ok()
    }

    /// Whether an encode converter can be produced for the shape.
    pub fn supports_encode(&self, shape: &Shape) -> bool {
        self.lookup(shape, Capability::Encode).is_ok()
    }

    fn converter(
        &self,
        shape: &Shape,
        capability: Capability,
    ) -> Result<Arc<dyn Converter>, ConfigError> {
        self.lookup(shape, capability)?.get(self)
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub(crate) fn lookup(
        &self,
        shape: &Shape,
        capability: Capability,
    ) -> Result<ConverterRef, ConfigError> {
        // Fast path. A cached forward reference whose slot is still empty
        // belongs to a synthesis in flight on another thread; treat it as
        // a miss and wait on the guard instead of handing out a reference
        // that would fail to dereference.
        if let Some(found) = self.cache_read().get(&(shape.clone(), capability)) {
            if self.is_bound(found) {
                return Ok(found.clone());
            }
        }
        let _guard = self.synthesis_guard();
        // Re-check under the guard: another thread may have finished the
        // same synthesis while this one waited. Slots cached here are
        // always bound, since failed synthesis unwinds its entries before
        // releasing the guard.
        if let Some(found) = self.cache_read().get(&(shape.clone(), capability)) {
            return Ok(found.clone());
        }
        self.resolve_uncached(shape, capability)
    }

    fn is_bound(&self, found: &ConverterRef) -> bool {
        match found {
            ConverterRef::Direct(_) => true,
            ConverterRef::Slot(index) => {
                matches!(self.arena_read().get(*index), Some(Some(_)))
            }
        }
    }

    /// Both capability halves for a component shape.
    pub(crate) fn pair(&self, shape: &Shape) -> Result<ConvPair, ConfigError> {
        Ok(ConvPair {
            decode: self.lookup_locked(shape, Capability::Decode)?,
            encode: self.lookup_locked(shape, Capability::Encode)?,
        })
    }

    /// Lookup variant used while already holding the synthesis guard
    /// (recursive calls during synthesis must not re-acquire the mutex).
    fn lookup_locked(
        &self,
        shape: &Shape,
        capability: Capability,
    ) -> Result<ConverterRef, ConfigError> {
        if let Some(found) = self.cache_read().get(&(shape.clone(), capability)) {
            return Ok(found.clone());
        }
        self.resolve_uncached(shape, capability)
    }

    fn resolve_uncached(
        &self,
        shape: &Shape,
        capability: Capability,
    ) -> Result<ConverterRef, ConfigError> {
        // Explicitly installed converters win over everything, latest first.
        for custom in self.custom.iter().rev() {
            if custom.supports(shape, capability) {
                tracing::debug!(shape = %shape, ?capability, "custom converter selected");
                let found = ConverterRef::Direct(custom.clone());
                self.cache_write()
                    .insert((shape.clone(), capability), found.clone());
                return Ok(found);
            }
        }

        match shape {
            Shape::Bool
            | Shape::I32
            | Shape::I64
            | Shape::F64
            | Shape::String
            | Shape::Timestamp => {
                // Only reachable for scalar tags, checked by the match arm.
                let conv = scalar_converter(shape)
                    .ok_or_else(|| ConfigError::NotRegistered {
                        type_name: shape.to_string(),
                    })?;
                Ok(self.cache_both(shape, ConverterRef::Direct(conv)))
            }
            Shape::List(element) => {
                let conv: Arc<dyn Converter> = Arc::new(ListConverter {
                    element_shape: (**element).clone(),
                    element: self.pair(element)?,
                });
                Ok(self.cache_both(shape, ConverterRef::Direct(conv)))
            }
            Shape::Map(value) => {
                let conv: Arc<dyn Converter> = Arc::new(MapConverter {
                    value_shape: (**value).clone(),
                    value: self.pair(value)?,
                });
                Ok(self.cache_both(shape, ConverterRef::Direct(conv)))
            }
            Shape::Nullable(inner) => {
                let conv: Arc<dyn Converter> = Arc::new(NullableConverter {
                    inner_shape: (**inner).clone(),
                    inner: self.pair(inner)?,
                });
                Ok(self.cache_both(shape, ConverterRef::Direct(conv)))
            }
            Shape::Optional(inner) => {
                let conv: Arc<dyn Converter> = Arc::new(OptionalConverter {
                    inner_shape: (**inner).clone(),
                    inner: self.pair(inner)?,
                });
                Ok(self.cache_both(shape, ConverterRef::Direct(conv)))
            }
            Shape::Named { name, args } => self.synthesize_named(shape, name, args),
            Shape::Var(param) => Err(ConfigError::UnresolvedTypeParameter {
                param: param.clone(),
            }),
        }
    }

    /// Insert one converter reference under both capability keys.
    fn cache_both(&self, shape: &Shape, found: ConverterRef) -> ConverterRef {
        let mut cache = self.cache_write();
        cache.insert((shape.clone(), Capability::Decode), found.clone());
        cache.insert((shape.clone(), Capability::Encode), found.clone());
        found
    }

    // -----------------------------------------------------------------------
    // Synthesis
    // -----------------------------------------------------------------------

    fn synthesize_named(
        &self,
        shape: &Shape,
        name: &str,
        args: &[Shape],
    ) -> Result<ConverterRef, ConfigError> {
        if let Some(def) = self.enums.get(name) {
            if !args.is_empty() {
                return Err(ConfigError::ArityMismatch {
                    type_name: name.to_string(),
                    declared: 0,
                    supplied: args.len(),
                });
            }
            tracing::debug!(type_name = %name, "synthesizing enum converter");
            let conv: Arc<dyn Converter> = Arc::new(EnumConverter { def: def.clone() });
            return Ok(self.cache_both(shape, ConverterRef::Direct(conv)));
        }

        let Some(def) = self.products.get(name) else {
            return Err(ConfigError::NotRegistered {
                type_name: shape.to_string(),
            });
        };
        if def.params.len() != args.len() {
            return Err(ConfigError::ArityMismatch {
                type_name: name.to_string(),
                declared: def.params.len(),
                supplied: args.len(),
            });
        }

        // Reserve the arena slot and publish the forward reference before
        // introspecting components, so a component type that resolves back
        // to this shape finds the slot index instead of recursing.
        let slot = {
            let mut arena = self.arena_write();
            arena.push(None);
            arena.len() - 1
        };
        let forward = ConverterRef::Slot(slot);
        self.cache_both(shape, forward.clone());
        tracing::debug!(type_name = %shape, slot, "synthesizing product converter");

        let build = || -> Result<Vec<FieldPlan>, ConfigError> {
            let mut plans = Vec::with_capacity(def.fields.len());
            for field in &def.fields {
                let concrete = resolve::substitute(&def.name, &def.params, args, &field.shape)?;
                plans.push(FieldPlan {
                    conv: self.pair(&concrete)?,
                    name: field.name.clone(),
                    shape: concrete,
                });
            }
            Ok(plans)
        };

        match build() {
            Ok(fields) => {
                let built: Arc<dyn Converter> = Arc::new(ProductConverter {
                    shape: shape.clone(),
                    type_name: def.name.clone(),
                    fields,
                    ignore_unknown: self.ignore_unknown,
                });
                self.arena_write()[slot] = Some(built);
                Ok(forward)
            }
            Err(e) => {
                // Unwind the placeholder so later lookups re-report the real
                // configuration error instead of an unbound forward ref.
                let mut cache = self.cache_write();
                cache.remove(&(shape.clone(), Capability::Decode));
                cache.remove(&(shape.clone(), Capability::Encode));
                Err(e)
            }
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
