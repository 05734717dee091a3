use std::fmt;

/// A stable index into a [`TypeInterner`].
///
/// Builtin types occupy the first indices, in the order of the
/// [`TypeId::UNKNOWN`]..[`TypeId::CHAR`] constants; compound types are
/// appended as they are first seen.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct TypeId(usize);

impl TypeId {
    pub const UNKNOWN: TypeId = TypeId(0);
    pub const VOID: TypeId = TypeId(1);
    pub const U8: TypeId = TypeId(2);
    pub const U16: TypeId = TypeId(3);
    pub const U32: TypeId = TypeId(4);
    pub const U64: TypeId = TypeId(5);
    pub const USIZE: TypeId = TypeId(6);
    pub const I8: TypeId = TypeId(7);
    pub const I16: TypeId = TypeId(8);
    pub const I32: TypeId = TypeId(9);
    pub const I64: TypeId = TypeId(10);
    pub const ISIZE: TypeId = TypeId(11);
    pub const BOOL: TypeId = TypeId(12);
    pub const CHAR: TypeId = TypeId(13);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Weak,
    Strong,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// Internal inference placeholder; never survives type checking.
    Unknown,
    Void,
    U8,
    U16,
    U32,
    U64,
    Usize,
    I8,
    I16,
    I32,
    I64,
    Isize,
    Bool,
    Char,
    Pointer {
        kind: PointerKind,
        inner: TypeId,
    },
    Array {
        size: usize,
        inner: TypeId,
    },
    Slice {
        inner: TypeId,
    },
    /// Created only by range expressions; not writable in source.
    Range {
        element: TypeId,
        is_inclusive: bool,
    },
}

/// A structural type plus its orthogonal mutability bit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Type {
    pub kind: TypeKind,
    pub is_mutable: bool,
}

impl Type {
    pub fn new(kind: TypeKind) -> Type {
        Type {
            kind,
            is_mutable: false,
        }
    }

    pub fn with_mutability(self, is_mutable: bool) -> Type {
        Type { is_mutable, ..self }
    }

    pub fn is_builtin(&self) -> bool {
        use TypeKind::*;
        matches!(
            self.kind,
            Unknown | Void | U8 | U16 | U32 | U64 | Usize | I8 | I16 | I32 | I64 | Isize
                | Bool | Char
        )
    }

    pub fn is_integer(&self) -> bool {
        use TypeKind::*;
        matches!(
            self.kind,
            U8 | U16 | U32 | U64 | Usize | I8 | I16 | I32 | I64 | Isize
        )
    }

    pub fn is_signed(&self) -> bool {
        use TypeKind::*;
        matches!(self.kind, I8 | I16 | I32 | I64 | Isize)
    }

    /// Width in bytes; zero for non-integers.
    pub fn width(&self) -> usize {
        use TypeKind::*;
        match self.kind {
            U8 | I8 => 1,
            U16 | I16 => 2,
            U32 | I32 => 4,
            U64 | I64 | Usize | Isize => 8,
            _ => 0,
        }
    }

    /// The source-level name of a builtin type, if this is one.
    pub fn builtin_name(&self) -> Option<&'static str> {
        use TypeKind::*;
        Some(match self.kind {
            Unknown => "unknown",
            Void => "void",
            U8 => "u8",
            U16 => "u16",
            U32 => "u32",
            U64 => "u64",
            Usize => "usize",
            I8 => "i8",
            I16 => "i16",
            I32 => "i32",
            I64 => "i64",
            Isize => "isize",
            Bool => "bool",
            Char => "char",
            _ => return None,
        })
    }
}

/// Structurally interns types into stable ids.
///
/// The table is append-only; a `TypeId` stays valid for the life of the
/// owning program. Lookup is a linear scan, which is fine for the table
/// sizes a single source file produces.
#[derive(Debug)]
pub struct TypeInterner {
    types: Vec<Type>,
}

const BUILTINS: [TypeKind; 14] = [
    TypeKind::Unknown,
    TypeKind::Void,
    TypeKind::U8,
    TypeKind::U16,
    TypeKind::U32,
    TypeKind::U64,
    TypeKind::Usize,
    TypeKind::I8,
    TypeKind::I16,
    TypeKind::I32,
    TypeKind::I64,
    TypeKind::Isize,
    TypeKind::Bool,
    TypeKind::Char,
];

impl TypeInterner {
    pub fn new() -> TypeInterner {
        TypeInterner {
            types: BUILTINS.iter().copied().map(Type::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, id: TypeId) -> &Type {
        &self.types[id.0]
    }

    /// Returns the id of a structurally equal entry, interning the type if it
    /// has not been seen before.
    pub fn find_or_add(&mut self, ty: Type) -> TypeId {
        if let Some(index) = self.types.iter().position(|existing| *existing == ty) {
            return TypeId(index);
        }
        self.types.push(ty);
        TypeId(self.types.len() - 1)
    }

    /// The sibling of `id` with the requested mutability.
    pub fn apply_mutability(&mut self, id: TypeId, is_mutable: bool) -> TypeId {
        let ty = *self.get(id);
        if ty.is_mutable == is_mutable {
            return id;
        }
        self.find_or_add(ty.with_mutability(is_mutable))
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        TypeInterner::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn builtins_sit_at_fixed_indices() {
        let interner = TypeInterner::new();
        assert_eq!(interner.get(TypeId::UNKNOWN).kind, TypeKind::Unknown);
        assert_eq!(interner.get(TypeId::VOID).kind, TypeKind::Void);
        assert_eq!(interner.get(TypeId::U8).kind, TypeKind::U8);
        assert_eq!(interner.get(TypeId::USIZE).kind, TypeKind::Usize);
        assert_eq!(interner.get(TypeId::I32).kind, TypeKind::I32);
        assert_eq!(interner.get(TypeId::CHAR).kind, TypeKind::Char);
        assert_eq!(interner.len(), 14);
        assert!(!interner.get(TypeId::I32).is_mutable);
    }

    #[test]
    fn structurally_equal_types_intern_to_the_same_id() {
        let mut interner = TypeInterner::new();
        let pointer = Type::new(TypeKind::Pointer {
            kind: PointerKind::Strong,
            inner: TypeId::I32,
        });
        let a = interner.find_or_add(pointer);
        let b = interner.find_or_add(pointer);
        assert_eq!(a, b);

        let weak = Type::new(TypeKind::Pointer {
            kind: PointerKind::Weak,
            inner: TypeId::I32,
        });
        assert_ne!(interner.find_or_add(weak), a);
    }

    #[test]
    fn builtin_lookup_reuses_the_preallocated_entry() {
        let mut interner = TypeInterner::new();
        assert_eq!(interner.find_or_add(Type::new(TypeKind::I32)), TypeId::I32);
        assert_eq!(interner.len(), 14);
    }

    #[test]
    fn apply_mutability_creates_a_sibling_once() {
        let mut interner = TypeInterner::new();
        let mutable = interner.apply_mutability(TypeId::I32, true);
        assert_ne!(mutable, TypeId::I32);
        assert!(interner.get(mutable).is_mutable);
        assert_eq!(interner.get(mutable).kind, TypeKind::I32);

        // Re-applying lands on the same entries in both directions.
        assert_eq!(interner.apply_mutability(TypeId::I32, true), mutable);
        assert_eq!(interner.apply_mutability(mutable, false), TypeId::I32);
        assert_eq!(interner.apply_mutability(mutable, true), mutable);
    }

    #[test]
    fn integer_predicates() {
        let interner = TypeInterner::new();
        assert!(interner.get(TypeId::U8).is_integer());
        assert!(interner.get(TypeId::ISIZE).is_integer());
        assert!(!interner.get(TypeId::BOOL).is_integer());
        assert!(!interner.get(TypeId::CHAR).is_integer());
        assert!(interner.get(TypeId::I64).is_signed());
        assert!(!interner.get(TypeId::U64).is_signed());
        assert_eq!(interner.get(TypeId::U16).width(), 2);
        assert_eq!(interner.get(TypeId::USIZE).width(), 8);
    }
}
