//! Tests for the standard representation policy

#[cfg(test)]
mod policy_tests {
    use super::super::policy::{
        has_non_erased_bounds, ErasedRepresentation, RepresentationPolicy, StandardPolicy,
    };
    use crate::model::{Container, DeclFlags, DeclKind, ProgramBuilder};

    #[test]
    fn test_basic_types() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let string = b.string_type();
        let object = b.object_type();
        let optional_int = b.optional(int);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.is_basic_type(&program, int));
        assert!(policy.is_basic_type(&program, string));
        assert!(!policy.is_basic_type(&program, object));
        assert!(!policy.is_basic_type(&program, optional_int));
        assert!(policy.is_optional(&program, optional_int));
        assert!(!policy.is_optional(&program, int));
    }

    #[test]
    fn test_erasure_of_unions_and_arguments() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let string = b.string_type();
        let union = b.union(&[int, string]);
        let optional_string = b.optional(string);
        let seq_of_union = b.sequential_type(union);
        let union_again = b.union(&[int, string]);
        let nested = b.sequential_type(union_again);
        let seq_of_int = b.sequential_type(int);
        let anything = b.anything_type();
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.has_erasure(&program, union));
        assert!(!policy.has_erasure(&program, optional_string));
        assert!(policy.has_erasure(&program, seq_of_union));
        assert!(policy.has_erasure(&program, nested));
        assert!(!policy.has_erasure(&program, seq_of_int));

        assert!(policy.will_erase_to_object(&program, union));
        assert!(policy.will_erase_to_object(&program, anything));
        assert!(!policy.will_erase_to_object(&program, optional_string));
        assert!(!policy.will_erase_to_object(&program, seq_of_int));
    }

    #[test]
    fn test_raw_types() {
        let mut b = ProgramBuilder::new();
        let sequential = b.core().sequential;
        let raw = b.type_of(sequential);
        let raw_again = b.type_of(sequential);
        let int = b.integer_type();
        let nested_raw = b.sequential_type(raw_again);
        let applied = b.sequential_type(int);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.is_raw(&program, raw));
        assert!(policy.is_raw(&program, nested_raw));
        assert!(!policy.is_raw(&program, applied));
        assert!(!policy.is_raw(&program, int));
    }

    #[test]
    fn test_erased_representation() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let optional_int = b.optional(int);
        let object = b.object_type();
        let class = b.class("Widget", Container::Unit);
        let widget = b.type_of(class);
        let holder = b.class("Holder", Container::Unit);
        let bounded = b.type_parameter(holder, "T", &[widget]);
        let unbounded = b.type_parameter(holder, "U", &[]);
        let bounded_type = b.type_parameter_type(bounded);
        let unbounded_type = b.type_parameter_type(unbounded);
        let core = b.core();
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert_eq!(
            policy.erased_representation(&program, int),
            ErasedRepresentation::Primitive(core.integer)
        );
        assert_eq!(
            policy.erased_representation(&program, optional_int),
            ErasedRepresentation::Class(core.integer)
        );
        assert_eq!(policy.erased_representation(&program, object), ErasedRepresentation::Object);
        assert_eq!(policy.erased_representation(&program, widget), ErasedRepresentation::Class(class));
        assert_eq!(
            policy.erased_representation(&program, bounded_type),
            ErasedRepresentation::Class(class)
        );
        assert_eq!(
            policy.erased_representation(&program, unbounded_type),
            ErasedRepresentation::Object
        );
    }

    #[test]
    fn test_non_erased_bounds_are_memoised() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let object = b.object_type();
        let holder = b.class("Holder", Container::Unit);
        let numeric = b.type_parameter(holder, "N", &[int]);
        let any = b.type_parameter(holder, "A", &[object]);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(has_non_erased_bounds(&program, &policy, numeric));
        assert!(!has_non_erased_bounds(&program, &policy, any));
        match &program.declarations.get(numeric).unwrap().kind {
            DeclKind::TypeParameter(info) => assert_eq!(info.has_non_erased_bounds.get(), Some(true)),
            other => panic!("expected a type parameter, got {:?}", other),
        }
        // Non-type-parameters answer false
        assert!(!has_non_erased_bounds(&program, &policy, holder));
    }

    #[test]
    fn test_substituted_bounds() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let holder = b.class("Holder", Container::Unit);
        b.type_parameter(holder, "N", &[int]);
        let object = b.object_type();
        let erased_argument = b.generic(holder, &[object]);
        let int_again = b.integer_type();
        let exact_argument = b.generic(holder, &[int_again]);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.has_substituted_bounds(&program, erased_argument));
        assert!(!policy.has_substituted_bounds(&program, exact_argument));
    }

    #[test]
    fn test_widening_override() {
        let mut b = ProgramBuilder::new();
        let object = b.object_type();
        let int = b.integer_type();
        let iface = b.interface("Source", Container::Unit);
        let formal = b.method("read", Container::Declaration(iface), object);
        b.add_flags(formal, DeclFlags::SHARED | DeclFlags::FORMAL);

        let class = b.class("Counter", Container::Unit);
        let narrowed = b.method("read", Container::Declaration(class), int);
        b.add_flags(narrowed, DeclFlags::SHARED | DeclFlags::ACTUAL);
        b.refines(narrowed, formal);

        let other = b.class("Echo", Container::Unit);
        let object_again = b.object_type();
        let same = b.method("read", Container::Declaration(other), object_again);
        b.add_flags(same, DeclFlags::SHARED | DeclFlags::ACTUAL);
        b.refines(same, formal);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.is_widening_typed_declaration(&program, narrowed));
        assert!(!policy.is_widening_typed_declaration(&program, same));
        assert!(!policy.is_widening_typed_declaration(&program, formal));
    }

    #[test]
    fn test_boxed_void() {
        let mut b = ProgramBuilder::new();
        let run = b.void_method("run", Container::Unit);
        let anything = b.anything_type();
        let typed = b.method("typed", Container::Unit, anything);
        let curried = b.void_method("curried", Container::Unit);
        b.add_parameter_list(curried);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(!policy.uses_boxed_void(&program, run));
        assert!(policy.uses_boxed_void(&program, typed));
        assert!(policy.uses_boxed_void(&program, curried));
    }

    #[test]
    fn test_creates_method_for_shared_class_functional_parameters() {
        let mut b = ProgramBuilder::new();
        let int = b.integer_type();
        let class = b.class_with_parameters("Task", Container::Unit);
        let shared = b.functional_parameter(class, "action", int);
        b.add_flags(shared, DeclFlags::SHARED);
        let private = b.functional_parameter(class, "hook", int);

        let anything = b.anything_type();
        let method = b.method("apply", Container::Unit, anything);
        let of_method = b.functional_parameter(method, "f", int);
        b.add_flags(of_method, DeclFlags::SHARED);
        let program = b.finish();
        let policy = StandardPolicy::new();

        assert!(policy.creates_method(&program, shared));
        assert!(!policy.creates_method(&program, private));
        assert!(!policy.creates_method(&program, of_method));
        assert!(!policy.creates_method(&program, class));
    }

    #[test]
    fn test_boolean_constants() {
        let b = ProgramBuilder::new();
        let core = b.core();
        let program = b.finish();
        let policy = StandardPolicy::new();
        assert!(policy.is_boolean_true(&program, core.true_value));
        assert!(policy.is_boolean_false(&program, core.false_value));
        assert!(!policy.is_boolean_true(&program, core.false_value));
    }
}
