use super::pool::ConstantPool;
use super::reader::ByteReader;
use super::ClassFormatError;

/// An attribute with its body left undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

/// One entry of the `BootstrapMethods` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapMethod {
    /// `MethodHandle` constant of the bootstrap method.
    pub method_handle: u16,
    /// Static argument constants, in order.
    pub arguments: Vec<u16>,
}

/// A field or method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MemberInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFormatError> {
        let mut reader = ByteReader::new(bytes);
        reader.expect_magic()?;
        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let pool = ConstantPool::parse(&mut reader)?;
        let access_flags = reader.read_u2()?;
        let this_class = reader.read_u2()?;
        let super_class = reader.read_u2()?;

        let interface_count = reader.read_u2()?;
        let interfaces = (0..interface_count)
            .map(|_| reader.read_u2())
            .collect::<Result<Vec<_>, _>>()?;

        let fields = read_members(&mut reader)?;
        let methods = read_members(&mut reader)?;
        let attributes = read_attributes(&mut reader)?;

        if !reader.is_at_end() {
            return Err(ClassFormatError::TrailingBytes);
        }

        Ok(Self {
            minor_version,
            major_version,
            pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABE_u32.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.pool.write(&mut out);
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());

        out.extend_from_slice(&(self.interfaces.len() as u16).to_be_bytes());
        for index in &self.interfaces {
            out.extend_from_slice(&index.to_be_bytes());
        }

        write_members(&mut out, &self.fields);
        write_members(&mut out, &self.methods);
        write_attributes(&mut out, &self.attributes);
        out
    }

    pub fn name(&self) -> Result<&str, ClassFormatError> {
        self.pool.class_name(self.this_class)
    }

    pub fn super_name(&self) -> Result<Option<&str>, ClassFormatError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.pool.class_name(self.super_class).map(Some)
    }

    /// Decoded `BootstrapMethods` attribute; empty when the class has none.
    pub fn bootstrap_methods(&self) -> Result<Vec<BootstrapMethod>, ClassFormatError> {
        let Some(attribute) = self
            .attributes
            .iter()
            .find(|a| matches!(self.pool.utf8(a.name_index), Ok(BOOTSTRAP_METHODS)))
        else {
            return Ok(Vec::new());
        };

        let mut reader = ByteReader::new(&attribute.info);
        let count = reader.read_u2()?;
        let mut methods = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let method_handle = reader.read_u2()?;
            let argument_count = reader.read_u2()?;
            let arguments = (0..argument_count)
                .map(|_| reader.read_u2())
                .collect::<Result<Vec<_>, _>>()?;
            methods.push(BootstrapMethod {
                method_handle,
                arguments,
            });
        }
        Ok(methods)
    }
}

pub const BOOTSTRAP_METHODS: &str = "BootstrapMethods";

fn read_members(reader: &mut ByteReader<'_>) -> Result<Vec<MemberInfo>, ClassFormatError> {
    let count = reader.read_u2()?;
    let mut members = Vec::with_capacity(count as usize);
    for _ in 0..count {
        members.push(MemberInfo {
            access_flags: reader.read_u2()?,
            name_index: reader.read_u2()?,
            descriptor_index: reader.read_u2()?,
            attributes: read_attributes(reader)?,
        });
    }
    Ok(members)
}

fn read_attributes(reader: &mut ByteReader<'_>) -> Result<Vec<Attribute>, ClassFormatError> {
    let count = reader.read_u2()?;
    let mut attributes = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        attributes.push(Attribute {
            name_index,
            info: reader.read_slice(length)?.to_vec(),
        });
    }
    Ok(attributes)
}

fn write_members(out: &mut Vec<u8>, members: &[MemberInfo]) {
    out.extend_from_slice(&(members.len() as u16).to_be_bytes());
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        write_attributes(out, &member.attributes);
    }
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[Attribute]) {
    out.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
    for attribute in attributes {
        out.extend_from_slice(&attribute.name_index.to_be_bytes());
        out.extend_from_slice(&(attribute.info.len() as u32).to_be_bytes());
        out.extend_from_slice(&attribute.info);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::ClassFileBuilder;

    #[test]
    fn test_parse_and_write_are_lossless() {
        let bytes = ClassFileBuilder::new("a")
            .extends("b")
            .field("c", "I")
            .method("d", "(La;)V")
            .method_ref("b", "e", "()V")
            .build();

        let class = ClassFile::parse(&bytes).unwrap();
        assert_eq!(class.to_bytes(), bytes);
        assert_eq!(class.name().unwrap(), "a");
        assert_eq!(class.super_name().unwrap(), Some("b"));
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.methods.len(), 1);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = ClassFileBuilder::new("a").build();
        bytes.push(0);
        assert!(matches!(
            ClassFile::parse(&bytes),
            Err(ClassFormatError::TrailingBytes)
        ));
    }
}
