/// Builds a [`Listener`](crate::Listener) that forwards every notification to an
/// async method of a shared handler.
///
/// `listener!(handler.method)` keeps the handler (`Arc<Handler>`) alive.
/// `listener!(weak handler.method)` takes a `Weak<Handler>` and drops
/// notifications once the handler is gone.
#[macro_export]
macro_rules! listener {
    (weak $handler:ident.$method:ident) => {
        $crate::Listener::new({
            let handler = $handler.clone();
            move |id, value| {
                let handler = handler.clone();
                async move {
                    if let Some(handler) = handler.upgrade() {
                        handler.$method(id, value).await;
                    }
                }
            }
        })
    };
    ($handler:ident.$method:ident) => {
        $crate::Listener::new({
            let handler = $handler.clone();
            move |id, value| {
                let handler = handler.clone();
                async move {
                    handler.$method(id, value).await;
                }
            }
        })
    };
}
