// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

mod data;
mod property;

pub use data::{LexicalEnvironmentType, ObjectHeapData, ObjectType};
pub(crate) use data::ObjectKind;
pub use property::{InternalPropertyId, InternalValue, Property, PropertyHeapData};

use data::{DeclarativeEnvironmentRecord, ObjectEnvironmentRecord, ObjectRecord};

use super::Value;
use crate::{
    engine::Fatal,
    heap::{Generation, Heap, LCacheLookup, ObjectIndex, PropertyIndex, StringIndex},
};

impl Heap {
    /// Allocate an object and enter it into the youngest generation before
    /// anything else can trigger a collection. The caller receives the
    /// object's only reference.
    fn register_object(&mut self, data: ObjectHeapData) -> ObjectIndex {
        let object = self.alloc_object(data);
        self.generations[Generation::YOUNGEST.as_usize()].push(object);
        object
    }

    pub fn create_object(
        &mut self,
        prototype: Option<ObjectIndex>,
        extensible: bool,
        object_type: ObjectType,
    ) -> ObjectIndex {
        self.register_object(ObjectHeapData::new(ObjectKind::Object(ObjectRecord {
            object_type,
            extensible,
            builtin: false,
            prototype,
            properties: None,
        })))
    }

    pub fn create_decl_lex_env(&mut self, outer: Option<ObjectIndex>) -> ObjectIndex {
        self.register_object(ObjectHeapData::new(ObjectKind::DeclarativeEnvironment(
            DeclarativeEnvironmentRecord {
                outer,
                properties: None,
            },
        )))
    }

    pub fn create_object_lex_env(
        &mut self,
        outer: Option<ObjectIndex>,
        binding_object: ObjectIndex,
        provide_this: bool,
    ) -> ObjectIndex {
        debug_assert!(!self.is_lexical_environment(binding_object));
        self.register_object(ObjectHeapData::new(ObjectKind::ObjectEnvironment(
            ObjectEnvironmentRecord {
                outer,
                binding_object,
                provide_this,
            },
        )))
    }

    pub fn ref_object(&mut self, object: ObjectIndex) {
        let gc = &mut self.objects[object].gc;
        match gc.refs.checked_add(1) {
            Some(refs) => gc.refs = refs,
            None => self.fatal(Fatal::RefCountLimit),
        }
    }

    /// Drop an external reference. The object stays alive until a
    /// collection finds it unreachable.
    pub fn deref_object(&mut self, object: ObjectIndex) {
        let gc = &mut self.objects[object].gc;
        debug_assert!(gc.refs > 0, "Object reference count underflow");
        gc.refs = gc.refs.saturating_sub(1);
    }

    pub fn object_refs(&self, object: ObjectIndex) -> u32 {
        self.objects[object].gc.refs
    }

    pub fn object_generation(&self, object: ObjectIndex) -> Generation {
        self.objects[object].gc.generation
    }

    /// Whether `object` still names a live object or environment.
    pub fn is_object_live(&self, object: ObjectIndex) -> bool {
        self.objects.contains(object)
    }

    pub fn object_may_ref_younger(&self, object: ObjectIndex) -> bool {
        self.objects[object].gc.may_ref_younger_objects
    }

    fn object_record(&self, object: ObjectIndex) -> &ObjectRecord {
        match &self.objects[object].kind {
            ObjectKind::Object(record) => record,
            _ => panic!("Expected an ordinary object, found a lexical environment"),
        }
    }

    fn object_record_mut(&mut self, object: ObjectIndex) -> &mut ObjectRecord {
        match &mut self.objects[object].kind {
            ObjectKind::Object(record) => record,
            _ => panic!("Expected an ordinary object, found a lexical environment"),
        }
    }

    pub fn is_lexical_environment(&self, object: ObjectIndex) -> bool {
        !matches!(self.objects[object].kind, ObjectKind::Object(_))
    }

    pub fn lex_env_type(&self, object: ObjectIndex) -> Option<LexicalEnvironmentType> {
        match self.objects[object].kind {
            ObjectKind::Object(_) => None,
            ObjectKind::DeclarativeEnvironment(_) => Some(LexicalEnvironmentType::Declarative),
            ObjectKind::ObjectEnvironment(_) => Some(LexicalEnvironmentType::ObjectBound),
        }
    }

    pub fn lex_env_outer(&self, object: ObjectIndex) -> Option<ObjectIndex> {
        match &self.objects[object].kind {
            ObjectKind::Object(_) => None,
            ObjectKind::DeclarativeEnvironment(record) => record.outer,
            ObjectKind::ObjectEnvironment(record) => record.outer,
        }
    }

    pub fn lex_env_binding_object(&self, object: ObjectIndex) -> Option<ObjectIndex> {
        match &self.objects[object].kind {
            ObjectKind::ObjectEnvironment(record) => Some(record.binding_object),
            _ => None,
        }
    }

    pub fn lex_env_provide_this(&self, object: ObjectIndex) -> bool {
        match &self.objects[object].kind {
            ObjectKind::ObjectEnvironment(record) => record.provide_this,
            _ => false,
        }
    }

    pub fn object_prototype(&self, object: ObjectIndex) -> Option<ObjectIndex> {
        self.object_record(object).prototype
    }

    pub fn set_object_prototype(&mut self, object: ObjectIndex, prototype: Option<ObjectIndex>) {
        self.object_record_mut(object).prototype = prototype;
        if let Some(prototype) = prototype {
            self.record_object_reference(object, prototype);
        }
    }

    pub fn object_type(&self, object: ObjectIndex) -> ObjectType {
        self.object_record(object).object_type
    }

    pub fn is_extensible(&self, object: ObjectIndex) -> bool {
        self.object_record(object).extensible
    }

    pub fn set_extensible(&mut self, object: ObjectIndex, extensible: bool) {
        self.object_record_mut(object).extensible = extensible;
    }

    pub fn is_builtin(&self, object: ObjectIndex) -> bool {
        self.object_record(object).builtin
    }

    pub fn set_builtin(&mut self, object: ObjectIndex, builtin: bool) {
        self.object_record_mut(object).builtin = builtin;
    }

    /// The object whose list holds the properties visible through `object`.
    /// Object-bound environments forward to their binding object.
    fn property_holder(&self, object: ObjectIndex) -> ObjectIndex {
        match &self.objects[object].kind {
            ObjectKind::ObjectEnvironment(record) => record.binding_object,
            _ => object,
        }
    }

    /// Write barrier: `holder` now references `target`.
    fn record_object_reference(&mut self, holder: ObjectIndex, target: ObjectIndex) {
        if self.objects[target].gc.generation < self.objects[holder].gc.generation {
            self.objects[holder].gc.may_ref_younger_objects = true;
        }
    }

    fn record_value_reference(&mut self, holder: ObjectIndex, value: Value) {
        if let Value::Object(target) = value {
            self.record_object_reference(holder, target);
        }
    }

    /// Walk the property list visible through `object`, most recently added
    /// first.
    pub fn object_properties(&self, object: ObjectIndex) -> impl Iterator<Item = PropertyIndex> {
        self.own_properties(self.property_holder(object))
    }

    pub(crate) fn own_properties(
        &self,
        object: ObjectIndex,
    ) -> impl Iterator<Item = PropertyIndex> {
        let mut next = self.objects[object].properties();
        core::iter::from_fn(move || {
            let property = next?;
            next = self.properties[property].next;
            Some(property)
        })
    }

    pub fn property(&self, property: PropertyIndex) -> &Property {
        &self.properties[property].property
    }

    fn find_named_property_uncached(
        &self,
        holder: ObjectIndex,
        name: StringIndex,
    ) -> Option<PropertyIndex> {
        self.own_properties(holder).find(|property| {
            self.property(*property)
                .name()
                .is_some_and(|property_name| self.strings_equal(property_name, name))
        })
    }

    /// Look up an own named property, consulting the lookup cache first and
    /// caching the outcome of a list scan, including a miss.
    pub fn find_named_property(
        &mut self,
        object: ObjectIndex,
        name: StringIndex,
    ) -> Option<PropertyIndex> {
        let holder = self.property_holder(object);
        match self.lcache_lookup(holder, name) {
            LCacheLookup::Hit(property) => return Some(property),
            LCacheLookup::NegativeHit => return None,
            LCacheLookup::Miss => {}
        }
        let property = self.find_named_property_uncached(holder, name);
        self.lcache_insert(holder, name, property);
        property
    }

    /// Like [`Heap::find_named_property`] for a property known to exist.
    pub fn get_named_property(&mut self, object: ObjectIndex, name: StringIndex) -> PropertyIndex {
        let Some(property) = self.find_named_property(object, name) else {
            panic!("Named property {:?} is missing", self.string_to_std(name));
        };
        property
    }

    pub fn get_named_data_property(
        &mut self,
        object: ObjectIndex,
        name: StringIndex,
    ) -> PropertyIndex {
        let property = self.get_named_property(object, name);
        debug_assert!(matches!(
            self.property(property),
            Property::NamedData { .. }
        ));
        property
    }

    fn link_property(&mut self, holder: ObjectIndex, property: Property) -> PropertyIndex {
        let index = self.alloc_property(PropertyHeapData {
            next: None,
            property,
        });
        // Read the head only after allocating, a collection may have run.
        let head = self.objects[holder].properties();
        self.properties[index].next = head;
        self.objects[holder].set_properties(Some(index));
        index
    }

    /// Add a named data property holding a copy of `value`.
    ///
    /// `object` must be rooted by the caller, allocation can collect.
    pub fn create_named_data_property(
        &mut self,
        object: ObjectIndex,
        name: StringIndex,
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> PropertyIndex {
        let holder = self.property_holder(object);
        debug_assert!(
            self.find_named_property_uncached(holder, name).is_none(),
            "Duplicate property name"
        );
        self.lcache_invalidate(holder, name);
        let name = self.ref_string(name);
        let value = self.copy_value(value, false);
        let property = self.link_property(
            holder,
            Property::NamedData {
                name,
                value,
                writable,
                enumerable,
                configurable,
                lcached: false,
            },
        );
        self.record_value_reference(holder, value);
        property
    }

    pub fn create_named_accessor_property(
        &mut self,
        object: ObjectIndex,
        name: StringIndex,
        getter: Option<ObjectIndex>,
        setter: Option<ObjectIndex>,
        enumerable: bool,
        configurable: bool,
    ) -> PropertyIndex {
        let holder = self.property_holder(object);
        debug_assert!(
            self.find_named_property_uncached(holder, name).is_none(),
            "Duplicate property name"
        );
        self.lcache_invalidate(holder, name);
        let name = self.ref_string(name);
        let property = self.link_property(
            holder,
            Property::NamedAccessor {
                name,
                getter,
                setter,
                enumerable,
                configurable,
                lcached: false,
            },
        );
        for target in [getter, setter].into_iter().flatten() {
            self.record_object_reference(holder, target);
        }
        property
    }

    /// Attach an internal property. The property takes over any references
    /// held by `value`.
    pub fn create_internal_property(
        &mut self,
        object: ObjectIndex,
        value: InternalValue,
    ) -> PropertyIndex {
        debug_assert!(
            self.find_internal_property(object, value.id()).is_none(),
            "Duplicate internal property"
        );
        let target = value.object();
        let property = self.link_property(object, Property::Internal(value));
        if let Some(target) = target {
            self.record_object_reference(object, target);
        }
        property
    }

    pub fn find_internal_property(
        &self,
        object: ObjectIndex,
        id: InternalPropertyId,
    ) -> Option<PropertyIndex> {
        self.own_properties(object).find(|property| {
            matches!(self.property(*property), Property::Internal(value) if value.id() == id)
        })
    }

    /// Internal property the object is known to carry.
    pub fn get_internal_property(
        &self,
        object: ObjectIndex,
        id: InternalPropertyId,
    ) -> PropertyIndex {
        let Some(property) = self.find_internal_property(object, id) else {
            panic!("Internal property {id:?} is missing");
        };
        property
    }

    pub fn internal_property_value(&self, property: PropertyIndex) -> &InternalValue {
        match self.property(property) {
            Property::Internal(value) => value,
            _ => panic!("Expected an internal property"),
        }
    }

    /// Bit alias of the stored value. Copy it to keep it beyond the
    /// property's lifetime.
    pub fn named_data_property_value(&self, property: PropertyIndex) -> Value {
        match self.property(property) {
            Property::NamedData { value, .. } => *value,
            _ => panic!("Expected a named data property"),
        }
    }

    /// Replace the value of a named data property of `object` with a copy of
    /// `value`, releasing the previous one.
    pub fn named_data_property_assign_value(
        &mut self,
        object: ObjectIndex,
        property: PropertyIndex,
        value: Value,
    ) {
        let holder = self.property_holder(object);
        let value = self.copy_value(value, false);
        let Property::NamedData { value: slot, .. } = &mut self.properties[property].property
        else {
            panic!("Expected a named data property");
        };
        let previous = core::mem::replace(slot, value);
        self.free_value(previous, false);
        self.record_value_reference(holder, value);
    }

    pub fn named_accessor_property_getter(&self, property: PropertyIndex) -> Option<ObjectIndex> {
        match self.property(property) {
            Property::NamedAccessor { getter, .. } => *getter,
            _ => panic!("Expected a named accessor property"),
        }
    }

    pub fn named_accessor_property_setter(&self, property: PropertyIndex) -> Option<ObjectIndex> {
        match self.property(property) {
            Property::NamedAccessor { setter, .. } => *setter,
            _ => panic!("Expected a named accessor property"),
        }
    }

    pub fn set_named_accessor_property_getter(
        &mut self,
        object: ObjectIndex,
        property: PropertyIndex,
        getter: Option<ObjectIndex>,
    ) {
        let holder = self.property_holder(object);
        match &mut self.properties[property].property {
            Property::NamedAccessor { getter: slot, .. } => *slot = getter,
            _ => panic!("Expected a named accessor property"),
        }
        if let Some(getter) = getter {
            self.record_object_reference(holder, getter);
        }
    }

    pub fn set_named_accessor_property_setter(
        &mut self,
        object: ObjectIndex,
        property: PropertyIndex,
        setter: Option<ObjectIndex>,
    ) {
        let holder = self.property_holder(object);
        match &mut self.properties[property].property {
            Property::NamedAccessor { setter: slot, .. } => *slot = setter,
            _ => panic!("Expected a named accessor property"),
        }
        if let Some(setter) = setter {
            self.record_object_reference(holder, setter);
        }
    }

    pub fn set_property_writable(&mut self, property: PropertyIndex, value: bool) {
        match &mut self.properties[property].property {
            Property::NamedData { writable, .. } => *writable = value,
            _ => panic!("Only named data properties are writable"),
        }
    }

    pub fn set_property_enumerable(&mut self, property: PropertyIndex, value: bool) {
        match &mut self.properties[property].property {
            Property::NamedData { enumerable, .. } | Property::NamedAccessor { enumerable, .. } => {
                *enumerable = value
            }
            Property::Internal(_) => panic!("Internal properties have no attributes"),
        }
    }

    pub fn set_property_configurable(&mut self, property: PropertyIndex, value: bool) {
        match &mut self.properties[property].property {
            Property::NamedData { configurable, .. }
            | Property::NamedAccessor { configurable, .. } => *configurable = value,
            Property::Internal(_) => panic!("Internal properties have no attributes"),
        }
    }

    /// Unlink `property` from the list of `object` and free it.
    pub fn delete_property(&mut self, object: ObjectIndex, property: PropertyIndex) {
        let holder = self.property_holder(object);
        let next = self.properties[property].next;
        let previous = self
            .own_properties(holder)
            .take_while(|candidate| *candidate != property)
            .last();
        match previous {
            Some(previous) => {
                debug_assert_eq!(self.properties[previous].next, Some(property));
                self.properties[previous].next = next;
            }
            None => {
                debug_assert_eq!(self.objects[holder].properties(), Some(property));
                self.objects[holder].set_properties(next);
            }
        }
        self.free_property(holder, property);
    }

    /// Free a property that is no longer linked into any list, dropping its
    /// lookup cache entry and releasing what it owns.
    pub fn free_property(&mut self, object: ObjectIndex, property: PropertyIndex) {
        let holder = self.property_holder(object);
        if self.property(property).is_lcached() {
            if let Some(name) = self.property(property).name() {
                self.lcache_invalidate(holder, name);
            }
        }
        debug_assert!(!self.property(property).is_lcached());
        let data = self.properties.free(property);
        self.release_property(data.property);
    }

    /// Release the strings and numbers a property owns.
    pub(crate) fn release_property(&mut self, property: Property) {
        match property {
            Property::NamedData { name, value, .. } => {
                self.deref_string(name);
                self.free_value(value, false);
            }
            Property::NamedAccessor { name, .. } => self.deref_string(name),
            Property::Internal(InternalValue::FormalParameters(names)) => {
                for &name in names.iter() {
                    self.deref_string(name);
                }
            }
            Property::Internal(InternalValue::PrimitiveString(string)) => {
                self.deref_string(string)
            }
            Property::Internal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecmascript::types::MagicString;

    #[test]
    fn create_find_and_delete() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let x = heap.new_string("x");
        let y = heap.new_string("y");
        let one = heap.make_number_value(1.0);

        assert_eq!(heap.find_named_property(object, x), None);
        let px = heap.create_named_data_property(object, x, one, true, true, true);
        assert_eq!(heap.string_refs(x), 2);
        let py = heap.create_named_accessor_property(object, y, None, None, false, true);
        assert_eq!(heap.find_named_property(object, x), Some(px));
        assert_eq!(heap.find_named_property(object, y), Some(py));
        assert_eq!(heap.object_properties(object).collect::<Vec<_>>(), [py, px]);
        assert!(heap.property(px).is_writable());
        assert!(!heap.property(py).is_enumerable());

        heap.delete_property(object, px);
        assert_eq!(heap.find_named_property(object, x), None);
        assert_eq!(heap.object_properties(object).collect::<Vec<_>>(), [py]);
        assert_eq!(heap.string_refs(x), 1);

        heap.free_value(one, false);
        heap.deref_string(x);
        heap.deref_string(y);
        heap.deref_object(object);
    }

    #[test]
    fn assignment_releases_previous_value() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        let name = heap.new_string_from_magic(MagicString::Value);
        let first = heap.new_string("first value string");
        let property = heap.create_named_data_property(
            object,
            name,
            Value::String(first),
            true,
            false,
            false,
        );
        assert_eq!(heap.string_refs(first), 2);

        let second = heap.make_number_value(2.0);
        heap.named_data_property_assign_value(object, property, second);
        assert_eq!(heap.string_refs(first), 1);
        let stored = heap.named_data_property_value(property);
        assert_ne!(stored, second);
        assert_eq!(heap.get_number(stored.as_number().unwrap()), 2.0);
        assert_eq!(heap.statistics().numbers, 2);

        heap.free_value(second, false);
        heap.deref_string(first);
        heap.deref_string(name);
    }

    #[test]
    fn object_environment_delegates_to_binding_object() {
        let mut heap = Heap::default();
        let global = heap.create_object(None, true, ObjectType::General);
        let env = heap.create_object_lex_env(None, global, true);
        let inner = heap.create_decl_lex_env(Some(env));
        assert_eq!(
            heap.lex_env_type(env),
            Some(LexicalEnvironmentType::ObjectBound)
        );
        assert_eq!(
            heap.lex_env_type(inner),
            Some(LexicalEnvironmentType::Declarative)
        );
        assert_eq!(heap.lex_env_type(global), None);
        assert_eq!(heap.lex_env_outer(inner), Some(env));
        assert_eq!(heap.lex_env_binding_object(env), Some(global));
        assert!(heap.lex_env_provide_this(env));

        let name = heap.new_string("answer");
        let property =
            heap.create_named_data_property(env, name, Value::from(true), true, true, true);
        assert_eq!(heap.find_named_property(global, name), Some(property));
        assert_eq!(heap.find_named_property(env, name), Some(property));
        assert_eq!(heap.object_properties(global).count(), 1);
        heap.deref_string(name);
    }

    #[test]
    fn internal_properties() {
        let mut heap = Heap::default();
        let function = heap.create_object(None, true, ObjectType::Function);
        let scope = heap.create_decl_lex_env(None);
        let a = heap.new_string("a");
        let b = heap.new_string("b");
        heap.create_internal_property(function, InternalValue::Scope(scope));
        heap.create_internal_property(function, InternalValue::Code(42));
        let parameters = Box::new([heap.ref_string(a), heap.ref_string(b)]);
        heap.create_internal_property(function, InternalValue::FormalParameters(parameters));
        assert_eq!(heap.string_refs(b), 2);

        let code = heap.get_internal_property(function, InternalPropertyId::Code);
        assert_eq!(heap.internal_property_value(code), &InternalValue::Code(42));
        assert_eq!(
            heap.find_internal_property(function, InternalPropertyId::Class),
            None
        );
        assert_eq!(
            heap.find_internal_property(scope, InternalPropertyId::Scope),
            None
        );
        // Internal properties are invisible to named lookup.
        assert_eq!(heap.find_named_property(function, a), None);

        let parameters = heap.get_internal_property(function, InternalPropertyId::FormalParameters);
        heap.delete_property(function, parameters);
        assert_eq!(heap.string_refs(b), 1);
    }

    #[test]
    #[should_panic(expected = "Internal property Class is missing")]
    fn missing_internal_property_panics() {
        let mut heap = Heap::default();
        let object = heap.create_object(None, true, ObjectType::General);
        heap.get_internal_property(object, InternalPropertyId::Class);
    }

    #[test]
    fn object_flags() {
        let mut heap = Heap::default();
        let prototype = heap.create_object(None, true, ObjectType::General);
        let array = heap.create_object(Some(prototype), true, ObjectType::Array);
        assert_eq!(heap.object_prototype(array), Some(prototype));
        assert_eq!(heap.object_type(array), ObjectType::Array);
        assert!(heap.is_extensible(array));
        heap.set_extensible(array, false);
        assert!(!heap.is_extensible(array));
        assert!(!heap.is_builtin(array));
        heap.set_builtin(array, true);
        assert!(heap.is_builtin(array));
        assert!(!heap.is_lexical_environment(array));
        assert_eq!(heap.object_generation(array), Generation::YOUNGEST);
        assert_eq!(heap.object_refs(array), 1);
        heap.ref_object(array);
        assert_eq!(heap.object_refs(array), 2);
    }
}
