// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::types::{MagicString, Value},
    heap::{HeapMark, ObjectIndex, PropertyIndex, StringIndex, WorkQueues},
};

/// Implementation-private property slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalPropertyId {
    Class,
    Scope,
    Code,
    ParametersMap,
    FormalParameters,
    PrimitiveString,
    PrimitiveNumber,
    PrimitiveBoolean,
    BuiltInId,
    BuiltInRoutineId,
    ExtensionId,
    NonInstantiatedBuiltInMask,
    NativeHandle,
}

/// Payload of an internal property. Only `Scope` and `ParametersMap` hold
/// object references; the rest are traced as leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum InternalValue {
    Class(MagicString),
    Scope(ObjectIndex),
    /// Offset of the function's code in the bytecode image.
    Code(u32),
    ParametersMap(ObjectIndex),
    /// Owns one reference to each parameter name.
    FormalParameters(Box<[StringIndex]>),
    /// Owns one reference.
    PrimitiveString(StringIndex),
    PrimitiveNumber(f64),
    PrimitiveBoolean(bool),
    BuiltInId(u16),
    BuiltInRoutineId(u16),
    ExtensionId(u32),
    NonInstantiatedBuiltInMask(u64),
    NativeHandle(usize),
}

impl InternalValue {
    pub const fn id(&self) -> InternalPropertyId {
        match self {
            InternalValue::Class(_) => InternalPropertyId::Class,
            InternalValue::Scope(_) => InternalPropertyId::Scope,
            InternalValue::Code(_) => InternalPropertyId::Code,
            InternalValue::ParametersMap(_) => InternalPropertyId::ParametersMap,
            InternalValue::FormalParameters(_) => InternalPropertyId::FormalParameters,
            InternalValue::PrimitiveString(_) => InternalPropertyId::PrimitiveString,
            InternalValue::PrimitiveNumber(_) => InternalPropertyId::PrimitiveNumber,
            InternalValue::PrimitiveBoolean(_) => InternalPropertyId::PrimitiveBoolean,
            InternalValue::BuiltInId(_) => InternalPropertyId::BuiltInId,
            InternalValue::BuiltInRoutineId(_) => InternalPropertyId::BuiltInRoutineId,
            InternalValue::ExtensionId(_) => InternalPropertyId::ExtensionId,
            InternalValue::NonInstantiatedBuiltInMask(_) => {
                InternalPropertyId::NonInstantiatedBuiltInMask
            }
            InternalValue::NativeHandle(_) => InternalPropertyId::NativeHandle,
        }
    }

    pub(crate) const fn object(&self) -> Option<ObjectIndex> {
        match self {
            InternalValue::Scope(object) | InternalValue::ParametersMap(object) => Some(*object),
            _ => None,
        }
    }
}

impl HeapMark for InternalValue {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.object().mark_values(queues);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    NamedData {
        name: StringIndex,
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
        /// Set while the lookup cache holds an entry for this property.
        lcached: bool,
    },
    NamedAccessor {
        name: StringIndex,
        getter: Option<ObjectIndex>,
        setter: Option<ObjectIndex>,
        enumerable: bool,
        configurable: bool,
        lcached: bool,
    },
    Internal(InternalValue),
}

impl Property {
    pub const fn name(&self) -> Option<StringIndex> {
        match self {
            Property::NamedData { name, .. } | Property::NamedAccessor { name, .. } => Some(*name),
            Property::Internal(_) => None,
        }
    }

    pub const fn is_lcached(&self) -> bool {
        match self {
            Property::NamedData { lcached, .. } | Property::NamedAccessor { lcached, .. } => {
                *lcached
            }
            Property::Internal(_) => false,
        }
    }

    pub(crate) fn set_lcached(&mut self, value: bool) {
        match self {
            Property::NamedData { lcached, .. } | Property::NamedAccessor { lcached, .. } => {
                *lcached = value
            }
            Property::Internal(_) => unreachable!("Internal properties are never cached"),
        }
    }

    pub const fn is_enumerable(&self) -> bool {
        match self {
            Property::NamedData { enumerable, .. } | Property::NamedAccessor { enumerable, .. } => {
                *enumerable
            }
            Property::Internal(_) => false,
        }
    }

    pub const fn is_configurable(&self) -> bool {
        match self {
            Property::NamedData { configurable, .. }
            | Property::NamedAccessor { configurable, .. } => *configurable,
            Property::Internal(_) => false,
        }
    }

    pub const fn is_writable(&self) -> bool {
        matches!(self, Property::NamedData { writable: true, .. })
    }
}

impl HeapMark for Property {
    fn mark_values(&self, queues: &mut WorkQueues) {
        match self {
            Property::NamedData { value, .. } => value.mark_values(queues),
            Property::NamedAccessor { getter, setter, .. } => {
                getter.mark_values(queues);
                setter.mark_values(queues);
            }
            Property::Internal(internal) => internal.mark_values(queues),
        }
    }
}

/// A link in an object's property list.
#[derive(Debug, Clone)]
pub struct PropertyHeapData {
    pub(crate) next: Option<PropertyIndex>,
    pub(crate) property: Property,
}
