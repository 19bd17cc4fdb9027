//! Access and property flags of classes and their members (JVMS §4.1, §4.5, §4.6).

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Class access and property flags
    pub struct ClassAccessFlags: u16 {
        /// Declared public; may be accessed from outside its package
        const PUBLIC = 0x0001;
        /// Declared final; no subclasses allowed
        const FINAL = 0x0010;
        /// Treat superclass methods specially when invoked by invokespecial
        const SUPER = 0x0020;
        /// Is an interface, not a class
        const INTERFACE = 0x0200;
        /// Declared abstract; must not be instantiated
        const ABSTRACT = 0x0400;
        /// Declared synthetic; not present in the source code
        const SYNTHETIC = 0x1000;
        /// Declared as an annotation interface
        const ANNOTATION = 0x2000;
        /// Declared as an enum class
        const ENUM = 0x4000;
        /// Is a module, not a class or interface
        const MODULE = 0x8000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// Field and method access and property flags
    pub struct MemberAccessFlags: u16 {
        /// Declared public
        const PUBLIC = 0x0001;
        /// Declared private
        const PRIVATE = 0x0002;
        /// Declared protected
        const PROTECTED = 0x0004;
        /// Declared static
        const STATIC = 0x0008;
        /// Declared final
        const FINAL = 0x0010;
        /// Method: declared synchronized
        const SYNCHRONIZED = 0x0020;
        /// Field: declared volatile
        const VOLATILE = 0x0040;
        /// Method: bridge method generated by the compiler
        const BRIDGE = 0x0040;
        /// Field: declared transient
        const TRANSIENT = 0x0080;
        /// Method: declared with a variable number of arguments
        const VARARGS = 0x0080;
        /// Method: declared native
        const NATIVE = 0x0100;
        /// Method: declared abstract
        const ABSTRACT = 0x0400;
        /// Method: floating-point mode is FP-strict
        const STRICT = 0x0800;
        /// Declared synthetic
        const SYNTHETIC = 0x1000;
        /// Field: element of an enum class
        const ENUM = 0x4000;
    }
}
