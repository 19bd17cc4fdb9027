//! Class names embedded in descriptors and generic signatures (JVMS §4.3, §4.7.9.1).
//!
//! A class is named in three textual shapes inside a class file:
//!
//! - as a bare internal name (`com/app/R$string`) or array descriptor in a `CONSTANT_Class`,
//! - inside field and method descriptors (`(Lcom/app/R$string;I)V`),
//! - inside generic signatures (`Ljava/util/List<Lcom/app/R$string;>;`).
//!
//! Each shape is parsed according to its grammar so that only real class-name positions are
//! substituted; identifiers such as type variable names are never touched, even when they
//! happen to spell a mapped name.

use crate::Result;

/// Maximum nesting of type arguments and arrays accepted in a signature.
const MAX_SIGNATURE_DEPTH: usize = 256;

/// The textual shape of a Utf8 entry that names classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// Name of a `CONSTANT_Class`: an internal name, or an array descriptor
    ClassName,
    /// Field or method descriptor
    Descriptor,
    /// Generic class, field or method signature
    Signature,
}

/// Applies `map` to every class name embedded in `value`, interpreted as `kind`.
///
/// `map` receives internal names in modified UTF-8 and returns the replacement for names that
/// should change. Returns `Ok(None)` if nothing was replaced.
///
/// # Errors
/// Returns [`crate::Error::Malformed`] if `value` does not follow the grammar of `kind`.
///
/// # Examples
///
/// ```rust
/// use rembed::classfile::{remap_symbol, SymbolKind};
///
/// let map = |name: &[u8]| (name == b"com/lib/a/R$string").then_some(&b"com/app/R$string"[..]);
/// let renamed = remap_symbol(SymbolKind::Descriptor, b"(Lcom/lib/a/R$string;I)V", &map)?;
/// assert_eq!(renamed.as_deref(), Some(&b"(Lcom/app/R$string;I)V"[..]));
/// # Ok::<(), rembed::Error>(())
/// ```
pub fn remap_symbol<'t, F>(kind: SymbolKind, value: &[u8], map: &F) -> Result<Option<Vec<u8>>>
where
    F: Fn(&[u8]) -> Option<&'t [u8]>,
{
    match kind {
        SymbolKind::ClassName if value.first() == Some(&b'[') => remap_descriptor(value, map),
        SymbolKind::ClassName => Ok(map(value).map(<[u8]>::to_vec)),
        SymbolKind::Descriptor => remap_descriptor(value, map),
        SymbolKind::Signature => {
            let mut mapper = SignatureMapper::new(value, map);
            mapper.signature()?;
            Ok(mapper.changed.then_some(mapper.out))
        }
    }
}

fn remap_descriptor<'t, F>(value: &[u8], map: &F) -> Result<Option<Vec<u8>>>
where
    F: Fn(&[u8]) -> Option<&'t [u8]>,
{
    let mut out = Vec::with_capacity(value.len());
    let mut changed = false;
    let mut position = 0;

    while position < value.len() {
        match value[position] {
            b'L' => {
                let Some(length) = value[position + 1..].iter().position(|&b| b == b';') else {
                    return Err(malformed_error!(
                        "Unterminated class name in descriptor at {}",
                        position
                    ));
                };
                let end = position + 1 + length;
                let name = &value[position + 1..end];
                out.push(b'L');
                match map(name) {
                    Some(target) => {
                        out.extend_from_slice(target);
                        changed = true;
                    }
                    None => out.extend_from_slice(name),
                }
                out.push(b';');
                position = end + 1;
            }
            b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V' | b'[' | b'(' | b')' => {
                out.push(value[position]);
                position += 1;
            }
            other => {
                return Err(malformed_error!(
                    "Unexpected character '{}' in descriptor at {}",
                    char::from(other),
                    position
                ))
            }
        }
    }

    Ok(changed.then_some(out))
}

/// Recursive-descent rewriter over the signature grammar. Every production copies its input to
/// `out`, substituting the outermost name of each class type signature.
struct SignatureMapper<'v, 'm, F> {
    input: &'v [u8],
    position: usize,
    depth: usize,
    out: Vec<u8>,
    changed: bool,
    map: &'m F,
}

impl<'v, 'm, 't, F> SignatureMapper<'v, 'm, F>
where
    F: Fn(&[u8]) -> Option<&'t [u8]>,
{
    fn new(input: &'v [u8], map: &'m F) -> Self {
        SignatureMapper {
            input,
            position: 0,
            depth: 0,
            out: Vec::with_capacity(input.len()),
            changed: false,
            map,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.position).copied()
    }

    fn expect(&mut self, expected: u8) -> Result<()> {
        match self.peek() {
            Some(byte) if byte == expected => {
                self.out.push(byte);
                self.position += 1;
                Ok(())
            }
            _ => Err(malformed_error!(
                "Expected '{}' in signature at {}",
                char::from(expected),
                self.position
            )),
        }
    }

    /// Copies bytes up to (not including) the first byte in `stops`, returning the copied run.
    fn take_until(&mut self, stops: &[u8]) -> Result<&'v [u8]> {
        let start = self.position;
        let rest = &self.input[start..];
        let Some(length) = rest.iter().position(|b| stops.contains(b)) else {
            return Err(malformed_error!("Unterminated identifier in signature at {}", start));
        };
        if length == 0 {
            return Err(malformed_error!("Empty identifier in signature at {}", start));
        }
        self.position += length;
        Ok(&rest[..length])
    }

    fn enter(&mut self) -> Result<()> {
        self.depth += 1;
        if self.depth > MAX_SIGNATURE_DEPTH {
            return Err(malformed_error!("Signature nesting exceeds {}", MAX_SIGNATURE_DEPTH));
        }
        Ok(())
    }

    /// Field, class or method signature; the three share enough structure to parse uniformly.
    fn signature(&mut self) -> Result<()> {
        if self.peek() == Some(b'<') {
            self.type_parameters()?;
        }

        if self.peek() == Some(b'(') {
            self.expect(b'(')?;
            while self.peek() != Some(b')') {
                self.java_type()?;
            }
            self.expect(b')')?;
            if self.peek() == Some(b'V') {
                self.expect(b'V')?;
            } else {
                self.java_type()?;
            }
            while self.peek() == Some(b'^') {
                self.expect(b'^')?;
                self.reference_type()?;
            }
        } else {
            self.reference_type()?;
            while self.peek().is_some() {
                self.reference_type()?;
            }
        }

        if self.peek().is_some() {
            return Err(malformed_error!(
                "Trailing data in signature at {}",
                self.position
            ));
        }
        Ok(())
    }

    fn type_parameters(&mut self) -> Result<()> {
        self.expect(b'<')?;
        loop {
            let identifier = self.take_until(b":")?;
            self.out.extend_from_slice(identifier);

            // class bound may be empty, interface bounds may not
            self.expect(b':')?;
            if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                self.reference_type()?;
            }
            while self.peek() == Some(b':') {
                self.expect(b':')?;
                self.reference_type()?;
            }

            if self.peek() == Some(b'>') {
                return self.expect(b'>');
            }
        }
    }

    fn java_type(&mut self) -> Result<()> {
        match self.peek() {
            Some(base @ (b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z')) => {
                self.expect(base)
            }
            _ => self.reference_type(),
        }
    }

    fn reference_type(&mut self) -> Result<()> {
        self.enter()?;
        let result = match self.peek() {
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.expect(b'T')?;
                let identifier = self.take_until(b";")?;
                self.out.extend_from_slice(identifier);
                self.expect(b';')
            }
            Some(b'[') => {
                self.expect(b'[')?;
                self.java_type()
            }
            _ => Err(malformed_error!(
                "Expected reference type in signature at {}",
                self.position
            )),
        };
        self.depth -= 1;
        result
    }

    fn class_type(&mut self) -> Result<()> {
        self.expect(b'L')?;
        let name = self.take_until(b"<.;")?;
        match (self.map)(name) {
            Some(target) => {
                self.out.extend_from_slice(target);
                self.changed = true;
            }
            None => self.out.extend_from_slice(name),
        }

        loop {
            match self.peek() {
                Some(b'<') => self.type_arguments()?,
                Some(b'.') => {
                    self.expect(b'.')?;
                    let inner = self.take_until(b"<.;")?;
                    self.out.extend_from_slice(inner);
                }
                Some(b';') => return self.expect(b';'),
                _ => {
                    return Err(malformed_error!(
                        "Unterminated class type in signature at {}",
                        self.position
                    ))
                }
            }
        }
    }

    fn type_arguments(&mut self) -> Result<()> {
        self.expect(b'<')?;
        loop {
            match self.peek() {
                Some(b'*') => self.expect(b'*')?,
                Some(wildcard @ (b'+' | b'-')) => {
                    self.expect(wildcard)?;
                    self.reference_type()?;
                }
                Some(b'>') => return self.expect(b'>'),
                _ => self.reference_type()?,
            }
        }
    }
}
