//! Builds minimal but well-formed class files.
//!
//! The bytes are produced by the crate's own [`ClassFile`] writer, so
//! parsing a built class and writing it again yields identical bytes.

use crate::bytecode::flags::{ACC_PRIVATE, ACC_PUBLIC};
use crate::bytecode::{
    Attribute, ClassFile, Constant, ConstantPool, MemberInfo, BOOTSTRAP_METHODS,
};

const ACC_SUPER: u16 = 0x0020;
const JAVA_8: u16 = 52;
const LAMBDA_METAFACTORY: &str = "java/lang/invoke/LambdaMetafactory";
const METAFACTORY_DESC: &str = "(Ljava/lang/invoke/MethodHandles$Lookup;Ljava/lang/String;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodType;Ljava/lang/invoke/MethodHandle;Ljava/lang/invoke/MethodType;)Ljava/lang/invoke/CallSite;";
const REF_INVOKE_STATIC: u8 = 6;

#[derive(Debug, Clone, Copy)]
enum RefKind {
    Field,
    Method,
}

#[derive(Debug, Clone)]
pub struct ClassFileBuilder {
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    access: u16,
    fields: Vec<(u16, String, String)>,
    methods: Vec<(u16, String, String)>,
    refs: Vec<(RefKind, String, String, String)>,
    lambdas: Vec<(String, String, String)>,
}

impl ClassFileBuilder {
    /// A public class extending `java/lang/Object`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            super_name: Some("java/lang/Object".to_string()),
            interfaces: Vec::new(),
            access: ACC_PUBLIC | ACC_SUPER,
            fields: Vec::new(),
            methods: Vec::new(),
            refs: Vec::new(),
            lambdas: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extends(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    /// No superclass at all, as for `java/lang/Object` itself.
    pub fn root(mut self) -> Self {
        self.super_name = None;
        self
    }

    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access = flags;
        self
    }

    /// A private field.
    pub fn field(self, name: &str, descriptor: &str) -> Self {
        self.field_with_access(ACC_PRIVATE, name, descriptor)
    }

    pub fn field_with_access(mut self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.fields
            .push((flags, name.to_string(), descriptor.to_string()));
        self
    }

    /// A public method.
    pub fn method(self, name: &str, descriptor: &str) -> Self {
        self.method_with_access(ACC_PUBLIC, name, descriptor)
    }

    pub fn method_with_access(mut self, flags: u16, name: &str, descriptor: &str) -> Self {
        self.methods
            .push((flags, name.to_string(), descriptor.to_string()));
        self
    }

    /// A `Methodref` constant, as left by a call site.
    pub fn method_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.refs.push((
            RefKind::Method,
            owner.to_string(),
            name.to_string(),
            descriptor.to_string(),
        ));
        self
    }

    /// A `Fieldref` constant, as left by a field access.
    pub fn field_ref(mut self, owner: &str, name: &str, descriptor: &str) -> Self {
        self.refs.push((
            RefKind::Field,
            owner.to_string(),
            name.to_string(),
            descriptor.to_string(),
        ));
        self
    }

    /// An `invokedynamic` call site bootstrapped by `LambdaMetafactory`
    /// that produces an instance of `interface` implementing `name`.
    pub fn lambda(mut self, interface: &str, name: &str, sam_descriptor: &str) -> Self {
        self.lambdas.push((
            interface.to_string(),
            name.to_string(),
            sam_descriptor.to_string(),
        ));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut pool = ConstantPool::default();
        let this_class = pool
            .find_or_push_class(&self.name)
            .expect("pool has room for this_class");
        let super_class = match &self.super_name {
            Some(name) => pool
                .find_or_push_class(name)
                .expect("pool has room for super_class"),
            None => 0,
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|name| pool.find_or_push_class(name).expect("pool has room"))
            .collect();

        let mut member = |(flags, name, descriptor): &(u16, String, String)| MemberInfo {
            access_flags: *flags,
            name_index: pool.find_or_push_utf8(name).expect("pool has room"),
            descriptor_index: pool.find_or_push_utf8(descriptor).expect("pool has room"),
            attributes: Vec::new(),
        };
        let fields = self.fields.iter().map(&mut member).collect();
        let methods = self.methods.iter().map(&mut member).collect();

        for (kind, owner, name, descriptor) in &self.refs {
            let class_index = pool.find_or_push_class(owner).expect("pool has room");
            let name_index = pool.find_or_push_utf8(name).expect("pool has room");
            let descriptor_index = pool.find_or_push_utf8(descriptor).expect("pool has room");
            let name_and_type_index = pool
                .push(Constant::NameAndType {
                    name_index,
                    descriptor_index,
                })
                .expect("pool has room");
            let constant = match kind {
                RefKind::Field => Constant::FieldRef {
                    class_index,
                    name_and_type_index,
                },
                RefKind::Method => Constant::MethodRef {
                    class_index,
                    name_and_type_index,
                },
            };
            pool.push(constant).expect("pool has room");
        }

        let mut attributes = Vec::new();
        if !self.lambdas.is_empty() {
            let handle = metafactory_handle(&mut pool);
            let mut info = (self.lambdas.len() as u16).to_be_bytes().to_vec();
            for (slot, (interface, name, sam)) in self.lambdas.iter().enumerate() {
                let sam_index = pool.find_or_push_utf8(sam).expect("pool has room");
                let sam_type = pool
                    .push(Constant::MethodType {
                        descriptor_index: sam_index,
                    })
                    .expect("pool has room");
                let name_and_type_index =
                    name_and_type(&mut pool, name, &format!("()L{interface};"));
                pool.push(Constant::InvokeDynamic {
                    bootstrap_method_attr_index: slot as u16,
                    name_and_type_index,
                })
                .expect("pool has room");

                info.extend_from_slice(&handle.to_be_bytes());
                info.extend_from_slice(&1u16.to_be_bytes());
                info.extend_from_slice(&sam_type.to_be_bytes());
            }
            attributes.push(Attribute {
                name_index: pool.find_or_push_utf8(BOOTSTRAP_METHODS).expect("pool has room"),
                info,
            });
        }

        ClassFile {
            minor_version: 0,
            major_version: JAVA_8,
            pool,
            access_flags: self.access,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        }
        .to_bytes()
    }
}

fn name_and_type(pool: &mut ConstantPool, name: &str, descriptor: &str) -> u16 {
    let name_index = pool.find_or_push_utf8(name).expect("pool has room");
    let descriptor_index = pool.find_or_push_utf8(descriptor).expect("pool has room");
    pool.push(Constant::NameAndType {
        name_index,
        descriptor_index,
    })
    .expect("pool has room")
}

fn metafactory_handle(pool: &mut ConstantPool) -> u16 {
    let class_index = pool
        .find_or_push_class(LAMBDA_METAFACTORY)
        .expect("pool has room");
    let name_and_type_index = name_and_type(pool, "metafactory", METAFACTORY_DESC);
    let reference_index = pool
        .push(Constant::MethodRef {
            class_index,
            name_and_type_index,
        })
        .expect("pool has room");
    pool.push(Constant::MethodHandle {
        reference_kind: REF_INVOKE_STATIC,
        reference_index,
    })
    .expect("pool has room")
}
