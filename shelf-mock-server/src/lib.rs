use std::collections::{btree_map, BTreeMap, BTreeSet, VecDeque};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use serde_json::{json, Value};
use shelf_api::{
    BookComment, BookId, CommentService, Error, ServerId, Time, UserId, Viewer, ENVELOPE_CREATED,
};

/// In-memory comment service, answering as the member whose session it holds
pub struct MockServer(Mutex<State>);

/// Where the id of a new comment goes in write responses
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdShape {
    Bare,
    Data,
    CommentId,
    DataCommentId,
    ResultCommentId,
    NumericString,
    Omitted,
}

impl IdShape {
    fn respond(&self, id: i64) -> Value {
        let message = "comment created";
        match self {
            IdShape::Bare => json!(id),
            IdShape::Data => json!({ "status": ENVELOPE_CREATED, "message": message, "data": id }),
            IdShape::CommentId => json!({ "commentId": id }),
            IdShape::DataCommentId => json!({
                "status": ENVELOPE_CREATED,
                "message": message,
                "data": { "commentId": id },
            }),
            IdShape::ResultCommentId => json!({
                "status": ENVELOPE_CREATED,
                "result": { "commentId": id },
            }),
            IdShape::NumericString => json!({
                "status": ENVELOPE_CREATED,
                "message": message,
                "data": id.to_string(),
            }),
            IdShape::Omitted => json!({
                "status": ENVELOPE_CREATED,
                "message": message,
                "data": "successfully created",
            }),
        }
    }
}

#[derive(Debug)]
struct State {
    session: UserId,
    books: BTreeSet<BookId>,
    comments: BTreeMap<i64, StoredComment>,
    next_id: i64,
    shape: IdShape,
    failures: VecDeque<Error>,
    refused_likes: usize,
    calls: usize,
}

#[derive(Debug)]
struct StoredComment {
    book: BookId,
    author: UserId,
    author_name: String,
    avatar: Option<String>,
    text: String,
    date: Time,
    likes: BTreeSet<UserId>,
}

impl MockServer {
    pub fn new(session: UserId) -> MockServer {
        MockServer(Mutex::new(State {
            session,
            books: BTreeSet::new(),
            comments: BTreeMap::new(),
            next_id: 1,
            shape: IdShape::Data,
            failures: VecDeque::new(),
            refused_likes: 0,
            calls: 0,
        }))
    }

    pub fn login_as(&self, user: UserId) {
        self.0.lock().session = user;
    }

    pub fn add_book(&self, book: BookId) {
        self.0.lock().books.insert(book);
    }

    pub fn set_id_shape(&self, shape: IdShape) {
        self.0.lock().shape = shape;
    }

    /// The next call, whatever it is, fails with `err`
    pub fn fail_next(&self, err: Error) {
        self.0.lock().failures.push_back(err);
    }

    /// The next like on an existing comment answers `false`
    pub fn refuse_next_like(&self) {
        self.0.lock().refused_likes += 1;
    }

    /// Adds a comment without going through the service, eg. someone else's
    pub fn seed_comment(&self, book: BookId, author: &Viewer, text: &str, date: Time) -> ServerId {
        let mut s = self.0.lock();
        s.books.insert(book);
        let id = s.insert(
            book,
            author.id.clone(),
            String::from(author.display_name()),
            author.avatar_url.clone(),
            text,
            date,
        );
        ServerId::Num(id)
    }

    /// Number of service calls received so far, failed ones included
    pub fn calls(&self) -> usize {
        self.0.lock().calls
    }

    pub fn comment_ids(&self, book: BookId) -> Vec<ServerId> {
        self.0
            .lock()
            .comments
            .iter()
            .filter(|(_, c)| c.book == book)
            .map(|(id, _)| ServerId::Num(*id))
            .collect()
    }

    pub fn likes_of(&self, id: &ServerId) -> Option<usize> {
        let s = self.0.lock();
        let id = numeric(id).ok()?;
        s.comments.get(&id).map(|c| c.likes.len())
    }

    /// What a book page would list
    pub fn book_comments(&self, book: BookId) -> Vec<BookComment> {
        self.0
            .lock()
            .comments
            .iter()
            .filter(|(_, c)| c.book == book)
            .map(|(id, c)| BookComment {
                id: ServerId::Num(*id),
                user: c.author_name.clone(),
                text: c.text.clone(),
                date: c.date,
                profile_img: c.avatar.clone(),
                likes: c.likes.len() as u64,
                user_id: c.author.clone(),
            })
            .collect()
    }

    /// Counts the call and fails it if a failure was queued
    fn receive(&self) -> Result<MutexGuard<'_, State>, Error> {
        let mut s = self.0.lock();
        s.calls += 1;
        match s.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(s),
        }
    }
}

impl State {
    fn insert(
        &mut self,
        book: BookId,
        author: UserId,
        author_name: String,
        avatar: Option<String>,
        text: &str,
        date: Time,
    ) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        self.comments.insert(
            id,
            StoredComment {
                book,
                author,
                author_name,
                avatar,
                text: String::from(text),
                date,
                likes: BTreeSet::new(),
            },
        );
        id
    }
}

fn numeric(id: &ServerId) -> Result<i64, Error> {
    match id {
        ServerId::Num(n) => Ok(*n),
        ServerId::Str(_) => Err(Error::CommentNotFound),
    }
}

impl MockServer {
    pub fn write(&self, book: BookId, text: &str) -> Result<Value, Error> {
        let mut s = self.receive()?;
        if !s.books.contains(&book) {
            return Err(Error::BookNotFound);
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::Unknown(Some(String::from("chat must not be empty"))));
        }
        let author = s.session.clone();
        let author_name = author.0.clone();
        let id = s.insert(book, author, author_name, None, text, Utc::now());
        Ok(s.shape.respond(id))
    }

    /// Toggles the session member's like
    pub fn like(&self, comment: &ServerId) -> Result<bool, Error> {
        let mut s = self.receive()?;
        let id = numeric(comment)?;
        if !s.comments.contains_key(&id) {
            return Err(Error::CommentNotFound);
        }
        if s.refused_likes > 0 {
            s.refused_likes -= 1;
            return Ok(false);
        }
        let session = s.session.clone();
        let Some(c) = s.comments.get_mut(&id) else {
            return Err(Error::CommentNotFound);
        };
        if !c.likes.remove(&session) {
            c.likes.insert(session);
        }
        Ok(true)
    }

    pub fn delete(&self, comment: &ServerId) -> Result<(), Error> {
        let mut s = self.receive()?;
        let id = numeric(comment)?;
        let session = s.session.clone();
        match s.comments.entry(id) {
            btree_map::Entry::Vacant(_) => Err(Error::CommentNotFound),
            btree_map::Entry::Occupied(c) if c.get().author != session => Err(Error::InvalidMember),
            btree_map::Entry::Occupied(c) => {
                c.remove();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl CommentService for MockServer {
    async fn write_comment(&self, book: BookId, text: &str) -> Result<Value, Error> {
        self.write(book, text)
    }

    async fn like_comment(&self, comment: &ServerId) -> Result<bool, Error> {
        self.like(comment)
    }

    async fn delete_comment(&self, comment: &ServerId) -> Result<(), Error> {
        self.delete(comment)
    }
}
