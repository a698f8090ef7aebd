//! 記録の一時停止

use std::cell::Cell;
use std::rc::Rc;

/// 生存中は変更通知の記録を止めるガード
///
/// `Drop` で取得時の状態へ戻すため、早期リターンやパニックでも停止状態が残らない。
/// 入れ子にした場合は最も外側のガードが外れたときに記録が再開する
#[must_use = "tracking resumes as soon as the guard is dropped"]
#[derive(Debug)]
pub struct TrackingGuard {
    flag: Rc<Cell<bool>>,
    previous: bool,
}

impl TrackingGuard {
    pub(crate) fn suspend(flag: &Rc<Cell<bool>>) -> Self {
        let previous = flag.replace(false);
        log::trace!("history tracking suspended (was {})", previous);
        Self {
            flag: Rc::clone(flag),
            previous,
        }
    }
}

impl Drop for TrackingGuard {
    fn drop(&mut self) {
        self.flag.set(self.previous);
        log::trace!("history tracking restored to {}", self.previous);
    }
}
