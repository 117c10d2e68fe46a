// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::heap::{GcHeader, HeapMark, ObjectIndex, PropertyIndex, WorkQueues};

/// Implementation class of an ordinary object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    General,
    Function,
    BoundFunction,
    BuiltInFunction,
    ExternalFunction,
    Array,
    String,
    Boolean,
    Number,
    Arguments,
    Date,
    RegExp,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexicalEnvironmentType {
    Declarative,
    /// Bindings live on a separate binding object, as for `with` and the
    /// global scope.
    ObjectBound,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectRecord {
    pub(crate) object_type: ObjectType,
    pub(crate) extensible: bool,
    pub(crate) builtin: bool,
    /// Traced, never reference counted.
    pub(crate) prototype: Option<ObjectIndex>,
    pub(crate) properties: Option<PropertyIndex>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct DeclarativeEnvironmentRecord {
    pub(crate) outer: Option<ObjectIndex>,
    pub(crate) properties: Option<PropertyIndex>,
}

/// Has no property list of its own.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ObjectEnvironmentRecord {
    pub(crate) outer: Option<ObjectIndex>,
    pub(crate) binding_object: ObjectIndex,
    pub(crate) provide_this: bool,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum ObjectKind {
    Object(ObjectRecord),
    DeclarativeEnvironment(DeclarativeEnvironmentRecord),
    ObjectEnvironment(ObjectEnvironmentRecord),
}

/// An ordinary object or a lexical environment.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeapData {
    pub(crate) gc: GcHeader,
    pub(crate) kind: ObjectKind,
}

impl ObjectHeapData {
    pub(crate) const fn new(kind: ObjectKind) -> Self {
        Self {
            gc: GcHeader::new(),
            kind,
        }
    }

    /// Head of the property list. Object-bound environments have none.
    pub(crate) const fn properties(&self) -> Option<PropertyIndex> {
        match &self.kind {
            ObjectKind::Object(record) => record.properties,
            ObjectKind::DeclarativeEnvironment(record) => record.properties,
            ObjectKind::ObjectEnvironment(_) => None,
        }
    }

    pub(crate) fn set_properties(&mut self, head: Option<PropertyIndex>) {
        match &mut self.kind {
            ObjectKind::Object(record) => record.properties = head,
            ObjectKind::DeclarativeEnvironment(record) => record.properties = head,
            ObjectKind::ObjectEnvironment(_) => {
                unreachable!("Object-bound environments do not own properties")
            }
        }
    }
}

impl HeapMark for ObjectKind {
    fn mark_values(&self, queues: &mut WorkQueues) {
        match self {
            ObjectKind::Object(record) => record.prototype.mark_values(queues),
            ObjectKind::DeclarativeEnvironment(record) => record.outer.mark_values(queues),
            ObjectKind::ObjectEnvironment(record) => {
                record.outer.mark_values(queues);
                record.binding_object.mark_values(queues);
            }
        }
    }
}
