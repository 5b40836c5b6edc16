//! End-to-end scenarios: the simple resolve/fail flows and the joint
//! promise flow, driven purely through the public API.

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use promise_cell::{Promise, State};

    fn hits<'env>(p: &Promise<'env>) -> &'env Cell<u32> {
        p.closure().unwrap().downcast_ref::<Cell<u32>>().unwrap()
    }

    fn bump<'env>(p: &Promise<'env>, _payload: Option<&'env [u8]>) {
        hits(p).set(hits(p).get() + 1);
    }

    #[test]
    fn simple_resolve() {
        let data_buffer = *b"resolution success";
        let observed = Cell::new(0u32);
        let stack_promise = Promise::new();
        stack_promise.set_closure(&observed);
        stack_promise
            .add_listener(
                |p, payload| {
                    assert_eq!(payload, Some(&b"resolution success"[..]));
                    hits(p).set(hits(p).get() + 1);
                },
                |_p, _payload| panic!("promise must not fail"),
            )
            .unwrap();

        stack_promise.resolve(Some(&data_buffer));
        assert_eq!(observed.get(), 1);
        assert_eq!(stack_promise.state(), State::Success);
    }

    #[test]
    fn simple_fail() {
        let observed = Cell::new(0u32);
        let stack_promise = Promise::new();
        stack_promise.set_closure(&observed);
        stack_promise
            .add_listener(
                |_p, _payload| panic!("promise must not succeed"),
                |p, payload| {
                    assert_eq!(payload, None);
                    hits(p).set(hits(p).get() + 1);
                },
            )
            .unwrap();

        stack_promise.fail(None);
        assert_eq!(observed.get(), 1);
        assert_eq!(stack_promise.state(), State::Failure);
    }

    /// The joint scenario: a parent joined on two promises resolves once,
    /// with an empty payload, only after both have settled, and the
    /// children's payloads stay readable from the parent's listener.
    #[test]
    fn joint() {
        fn on_joint_success<'env>(p: &Promise<'env>, payload: Option<&'env [u8]>) {
            assert_eq!(payload, None);
            let collected = p
                .closure()
                .unwrap()
                .downcast_ref::<RefCell<Vec<Option<Vec<u8>>>>>()
                .unwrap();
            for dep in p.dependencies() {
                collected
                    .borrow_mut()
                    .push(dep.payload().map(<[u8]>::to_vec));
            }
        }

        let data_buffer = *b"resolution success";
        let collected: RefCell<Vec<Option<Vec<u8>>>> = RefCell::new(Vec::new());
        let stack_promise = Promise::new();
        let stack_promise2 = Promise::new();
        let joint_promise = Promise::new();
        joint_promise.set_closure(&collected);

        assert_eq!(joint_promise.add_joint(&stack_promise).unwrap(), 0);
        assert_eq!(joint_promise.add_joint(&stack_promise2).unwrap(), 1);
        joint_promise
            .add_listener(on_joint_success, |_p, _payload| {
                panic!("joint parent must not fail")
            })
            .unwrap();

        stack_promise.resolve(Some(&data_buffer));
        assert!(!joint_promise.is_done());
        assert!(collected.borrow().is_empty());

        stack_promise2.resolve(None);
        assert_eq!(joint_promise.state(), State::Success);
        assert_eq!(joint_promise.payload(), None);
        assert_eq!(
            *collected.borrow(),
            vec![Some(b"resolution success".to_vec()), None]
        );
    }

    /// Two promises with no join relationship settle independently; each
    /// listener pair fires exactly once for its own promise.
    #[test]
    fn independent_promises_do_not_interfere() {
        let first_hits = Cell::new(0u32);
        let second_hits = Cell::new(0u32);
        let first = Promise::new();
        let second = Promise::new();
        first.set_closure(&first_hits);
        second.set_closure(&second_hits);
        first.add_listener(bump, bump).unwrap();
        second.add_listener(bump, bump).unwrap();

        first.resolve(Some(b"alpha"));
        assert_eq!((first_hits.get(), second_hits.get()), (1, 0));
        second.fail(Some(b"beta"));
        assert_eq!((first_hits.get(), second_hits.get()), (1, 1));
        assert_eq!(first.payload(), Some(&b"alpha"[..]));
        assert_eq!(second.payload(), Some(&b"beta"[..]));
    }
}
