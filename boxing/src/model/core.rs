//! Language-module declarations
//!
//! The representation policy needs to recognise a handful of declarations of
//! the language module (the top types, the basic value types, `Callable`,
//! `Iterable`). [`CoreDeclarations::install`] creates them in a fresh
//! declaration table and records their ids.

use super::declarations::{
    ClassInfo, Container, DeclFlags, DeclKind, DeclarationTable, InterfaceInfo, MethodInfo,
    ParameterList, TypeParameterInfo, Variance,
};
use super::id_types::DeclId;
use super::string_intern::StringInterner;
use super::types::TypeTable;

#[derive(Debug, Clone, Copy)]
pub struct CoreDeclarations {
    pub anything: DeclId,
    pub object: DeclId,
    pub basic: DeclId,
    pub null: DeclId,
    pub boolean: DeclId,
    pub true_value: DeclId,
    pub false_value: DeclId,
    pub integer: DeclId,
    pub float: DeclId,
    pub byte: DeclId,
    pub character: DeclId,
    pub string: DeclId,
    pub callable: DeclId,
    pub iterable: DeclId,
    pub sequential: DeclId,
}

struct Installer<'a> {
    interner: &'a mut StringInterner,
    declarations: &'a mut DeclarationTable,
    types: &'a mut TypeTable,
}

impl Installer<'_> {
    fn class(&mut self, name: &str, extends: Option<DeclId>) -> DeclId {
        let extended_type = extends.map(|parent| self.types.nominal(parent, &[]));
        let id = self.declarations.add(
            Some(self.interner.intern(name)),
            DeclKind::Class(ClassInfo {
                extended_type,
                ..ClassInfo::default()
            }),
            Container::Unit,
        );
        self.toplevel(id);
        id
    }

    fn interface(&mut self, name: &str) -> DeclId {
        let id = self.declarations.add(
            Some(self.interner.intern(name)),
            DeclKind::Interface(InterfaceInfo::default()),
            Container::Unit,
        );
        self.toplevel(id);
        id
    }

    fn toplevel(&mut self, id: DeclId) {
        if let Some(decl) = self.declarations.get_mut(id) {
            decl.flags.insert(DeclFlags::SHARED | DeclFlags::TOPLEVEL);
        }
    }

    fn type_parameter(&mut self, owner: DeclId, name: &str, variance: Variance) -> DeclId {
        let id = self.declarations.add(
            Some(self.interner.intern(name)),
            DeclKind::TypeParameter(TypeParameterInfo::new(variance, Vec::new())),
            Container::Declaration(owner),
        );
        if let Some(decl) = self.declarations.get_mut(owner) {
            decl.type_parameters.push(id);
        }
        id
    }

    fn boolean_value(&mut self, name: &str, boolean: DeclId) -> DeclId {
        let id = self
            .declarations
            .add(Some(self.interner.intern(name)), DeclKind::Value, Container::Unit);
        let ty = self.types.nominal(boolean, &[]);
        if let Some(decl) = self.declarations.get_mut(id) {
            decl.type_id = Some(ty);
        }
        self.toplevel(id);
        id
    }

    /// `shared formal <result> name(<params>)` member of `owner`
    fn member_method(&mut self, owner: DeclId, name: &str, params: &[(&str, DeclId)]) -> DeclId {
        let id = self.declarations.add(
            Some(self.interner.intern(name)),
            DeclKind::Method(MethodInfo::default()),
            Container::Declaration(owner),
        );
        let mut list = ParameterList::new();
        for (param_name, param_type) in params {
            let param = self.declarations.add(
                Some(self.interner.intern(param_name)),
                DeclKind::Value,
                Container::Declaration(id),
            );
            let ty = self.types.nominal(*param_type, &[]);
            if let Some(decl) = self.declarations.get_mut(param) {
                decl.type_id = Some(ty);
                decl.flags.insert(DeclFlags::PARAMETER);
            }
            list.push(param);
        }
        if let Some(decl) = self.declarations.get_mut(id) {
            decl.flags.insert(DeclFlags::SHARED | DeclFlags::FORMAL);
            if let DeclKind::Method(info) = &mut decl.kind {
                info.parameter_lists.push(list);
            }
        }
        if let Some(DeclKind::Interface(info)) = self.declarations.get_mut(owner).map(|d| &mut d.kind) {
            info.members.push(id);
        }
        id
    }
}

impl CoreDeclarations {
    /// Create the language-module declarations
    pub fn install(
        interner: &mut StringInterner,
        declarations: &mut DeclarationTable,
        types: &mut TypeTable,
    ) -> Self {
        let mut installer = Installer {
            interner,
            declarations,
            types,
        };

        let anything = installer.class("Anything", None);
        let object = installer.class("Object", Some(anything));
        let null = installer.class("Null", Some(anything));
        let basic = installer.class("Basic", Some(object));
        let boolean = installer.class("Boolean", Some(basic));
        let true_value = installer.boolean_value("true", boolean);
        let false_value = installer.boolean_value("false", boolean);
        let integer = installer.class("Integer", Some(object));
        let float = installer.class("Float", Some(object));
        let byte = installer.class("Byte", Some(object));
        let character = installer.class("Character", Some(object));
        let string = installer.class("String", Some(object));

        let callable = installer.interface("Callable");
        installer.type_parameter(callable, "Return", Variance::Covariant);
        installer.type_parameter(callable, "Arguments", Variance::Contravariant);

        let iterable = installer.interface("Iterable");
        installer.type_parameter(iterable, "Element", Variance::Covariant);
        installer.type_parameter(iterable, "Absent", Variance::Covariant);

        let sequential = installer.interface("Sequential");
        let element = installer.type_parameter(sequential, "Element", Variance::Covariant);
        let element_type = installer.types.type_parameter(element);
        let null_type = installer.types.nominal(null, &[]);
        let iterable_type = installer.types.nominal(iterable, &[element_type, null_type]);
        if let Some(DeclKind::Interface(info)) =
            installer.declarations.get_mut(sequential).map(|d| &mut d.kind)
        {
            info.satisfied_types.push(iterable_type);
        }

        // Element? get(Integer index)
        let get = installer.member_method(sequential, "get", &[("index", integer)]);
        let get_element = installer.types.type_parameter(element);
        let get_null = installer.types.nominal(null, &[]);
        let get_result = installer.types.union(&[get_element, get_null]);
        // Element[] span(Integer from, Integer to)
        let span = installer.member_method(sequential, "span", &[("from", integer), ("to", integer)]);
        let span_element = installer.types.type_parameter(element);
        let span_result = installer.types.nominal(sequential, &[span_element]);
        for (method, result) in [(get, get_result), (span, span_result)] {
            if let Some(decl) = installer.declarations.get_mut(method) {
                decl.type_id = Some(result);
            }
        }

        Self {
            anything,
            object,
            basic,
            null,
            boolean,
            true_value,
            false_value,
            integer,
            float,
            byte,
            character,
            string,
            callable,
            iterable,
            sequential,
        }
    }

    /// Classes whose instances have a primitive representation
    pub fn is_basic_class(&self, id: DeclId) -> bool {
        [
            self.boolean,
            self.integer,
            self.float,
            self.byte,
            self.character,
            self.string,
        ]
        .contains(&id)
    }

    /// Numeric classes whose constructor applied to a literal is itself a literal
    pub fn is_numeric_class(&self, id: DeclId) -> bool {
        id == self.integer || id == self.float || id == self.byte
    }

    /// Declarations that always erase to the top object type
    pub fn is_top_class(&self, id: DeclId) -> bool {
        id == self.anything || id == self.object || id == self.basic || id == self.null
    }
}
