#![cfg(test)]

use std::{cmp, collections::HashSet, ops::RangeTo, panic::AssertUnwindSafe};

use bolero::generator::TypeGenerator;
use shelf_mock_server::{IdShape, MockServer};

use crate::{
    api::{self, BookId, CommentId, PendingId, ServerId, UserId, Viewer, MAX_COMMENT_LEN},
    CreateOutcome, DeleteOutcome, LikeOutcome, MutationController, MutationError, Snapshot,
};

macro_rules! do_tokio_test {
    ( $name:ident, $gen:expr, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_generator($gen)
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

const BOOK: BookId = BookId(3);

const SHAPES: [IdShape; 7] = [
    IdShape::Bare,
    IdShape::Data,
    IdShape::CommentId,
    IdShape::DataCommentId,
    IdShape::ResultCommentId,
    IdShape::NumericString,
    IdShape::Omitted,
];

#[derive(Clone, Debug, bolero::generator::TypeGenerator)]
enum FuzzOp {
    Create {
        #[generator(bolero::generator::gen_with::<String>().len(0..220usize))]
        text: String,
        shape: u8,
    },
    Like {
        idx: usize,
    },
    Delete {
        idx: usize,
        confirm: bool,
    },
    LikePlaceholder,
    FailNext {
        kind: u8,
    },
    SwitchViewer,
}

fn resize_int(fuzz_id: usize, RangeTo { end }: RangeTo<usize>) -> Option<usize> {
    if end == 0 {
        return None;
    }
    let bucket_size = cmp::max(1, usize::MAX / end); // in case we rounded to 0
    let id = fuzz_id / bucket_size;
    Some(cmp::min(id, end - 1)) // in case id was actually over end - 1 due to rounding
}

fn failure(kind: u8) -> api::Error {
    match kind % 5 {
        0 => api::Error::BookNotFound,
        1 => api::Error::CommentNotFound,
        2 => api::Error::InvalidMember,
        3 => api::Error::Unknown(None),
        _ => api::Error::Unknown(Some(String::from("server is tired"))),
    }
}

struct Fuzzer<'a> {
    server: &'a MockServer,
    controller: MutationController<&'a MockServer>,
    viewers: [Viewer; 2],
    current: usize,
}

impl<'a> Fuzzer<'a> {
    fn new(server: &'a MockServer) -> Fuzzer<'a> {
        let viewers = [
            Viewer::new(UserId(String::from("ann"))),
            Viewer::new(UserId(String::from("bob"))),
        ];
        server.add_book(BOOK);
        server.login_as(viewers[0].id.clone());
        Fuzzer {
            server,
            controller: MutationController::new(BOOK, server),
            viewers,
            current: 0,
        }
    }

    fn viewer(&self) -> &Viewer {
        &self.viewers[self.current]
    }

    fn pick(&self, idx: usize) -> Option<ServerId> {
        let s = self.controller.snapshot();
        let i = resize_int(idx, ..s.len())?;
        s.comments()[i].server_id().cloned()
    }

    async fn execute_fuzz_op(&mut self, op: FuzzOp) {
        let before = self.controller.snapshot();
        let calls_before = self.server.calls();
        match op {
            FuzzOp::Create { text, shape } => {
                self.server.set_id_shape(SHAPES[shape as usize % SHAPES.len()]);
                let res = self.controller.create(Some(self.viewer()), &text).await;
                let after = self.controller.snapshot();
                if text.chars().count() > MAX_COMMENT_LEN || text.trim().is_empty() {
                    assert!(
                        matches!(res, Err(ref e) if e.is_local()),
                        "invalid text {text:?} gave {res:?}"
                    );
                    assert_eq!(self.server.calls(), calls_before);
                }
                match res {
                    Ok(CreateOutcome::Inserted(id)) => {
                        let head = &after.comments()[0];
                        assert_eq!(head.id, CommentId::Confirmed(id));
                        assert_eq!(head.like_count, 0);
                        assert_eq!(head.text, text.trim());
                        assert_eq!(after.len(), before.len() + 1);
                    }
                    Ok(CreateOutcome::Unresolved { .. }) | Err(_) => assert_eq!(after, before),
                }
            }
            FuzzOp::Like { idx } => {
                let Some(id) = self.pick(idx) else { return };
                let res = self
                    .controller
                    .toggle_like(Some(self.viewer()), &CommentId::Confirmed(id.clone()))
                    .await;
                let after = self.controller.snapshot();
                let count = |s: &Snapshot| s.get(&id).map(|c| c.like_count).unwrap_or(0);
                match res {
                    Ok(LikeOutcome::Liked) => {
                        assert!(!before.is_liked(&id) && after.is_liked(&id));
                        assert_eq!(count(&after), count(&before) + 1);
                    }
                    Ok(LikeOutcome::Unliked) => {
                        assert!(before.is_liked(&id) && !after.is_liked(&id));
                        assert_eq!(count(&after), count(&before).saturating_sub(1));
                    }
                    Err(_) => assert_eq!(after, before),
                }
            }
            FuzzOp::Delete { idx, confirm } => {
                let Some(id) = self.pick(idx) else { return };
                let is_author = before
                    .get(&id)
                    .map(|c| c.is_authored_by(&self.viewer().id))
                    .unwrap_or(false);
                let res = self
                    .controller
                    .delete(Some(self.viewer()), &CommentId::Confirmed(id.clone()), |_| confirm)
                    .await;
                let after = self.controller.snapshot();
                match res {
                    Ok(DeleteOutcome::Deleted) => {
                        assert!(is_author && confirm);
                        assert!(after.get(&id).is_none());
                        assert!(!after.is_liked(&id));
                        assert_eq!(after.len(), before.len() - 1);
                    }
                    Ok(DeleteOutcome::AlreadyGone) => panic!("listed comment {id} seen as gone"),
                    Ok(DeleteOutcome::Cancelled) => {
                        assert!(!confirm);
                        assert_eq!(after, before);
                        assert_eq!(self.server.calls(), calls_before);
                    }
                    Err(MutationError::NotAuthor(_)) => {
                        assert!(!is_author);
                        assert_eq!(after, before);
                        assert_eq!(self.server.calls(), calls_before);
                    }
                    Err(_) => assert_eq!(after, before),
                }
            }
            FuzzOp::LikePlaceholder => {
                let pending = PendingId::allocate();
                let res = self
                    .controller
                    .toggle_like(Some(self.viewer()), &CommentId::Pending(pending))
                    .await;
                assert_eq!(res, Err(MutationError::NotSynchronized(pending)));
                assert_eq!(self.server.calls(), calls_before);
                assert_eq!(self.controller.snapshot(), before);
            }
            FuzzOp::FailNext { kind } => self.server.fail_next(failure(kind)),
            FuzzOp::SwitchViewer => {
                self.current = 1 - self.current;
                self.server.login_as(self.viewer().id.clone());
            }
        }
        self.check_invariants();
    }

    fn check_invariants(&self) {
        let s = self.controller.snapshot();
        assert!(s.drafts().is_empty(), "draft left behind: {s:?}");
        let mut ids = HashSet::new();
        for c in s.comments() {
            let id = c
                .server_id()
                .unwrap_or_else(|| panic!("placeholder {} in confirmed list", c.id));
            assert!(ids.insert(id.clone()), "comment {id} listed twice");
        }
        for id in s.liked() {
            assert!(ids.contains(id), "liked comment {id} is not listed");
        }
        let on_server: HashSet<ServerId> = self.server.comment_ids(BOOK).into_iter().collect();
        assert!(
            ids.is_subset(&on_server),
            "listed {ids:?} but server only has {on_server:?}"
        );
    }
}

do_tokio_test!(
    reconcile_against_mock,
    bolero::generator::gen_with::<Vec<FuzzOp>>().len(1..60usize),
    |ops: Vec<FuzzOp>| async move {
        let server = MockServer::new(UserId(String::from("ann")));
        let mut fuzzer = Fuzzer::new(&server);
        for op in ops {
            fuzzer.execute_fuzz_op(op).await;
        }
    }
);

#[test]
fn resize_int_stays_in_range() {
    assert_eq!(resize_int(0, ..0), None);
    assert_eq!(resize_int(usize::MAX, ..3), Some(2));
    assert_eq!(resize_int(0, ..3), Some(0));
}
