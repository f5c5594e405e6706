//! Application event loop.
//!
//! Wires the bootstrapper to a real host: a winit window natively, a canvas
//! created inside the host document's container element on wasm32. The
//! event loop owns the [`WinitHost`] and forwards its events into the
//! callbacks the bootstrapper registered: `Resized` into the resize
//! listener, `RedrawRequested` into the frame callback and mouse input
//! into the orbit controller.

use std::sync::Arc;

use instant::{Duration, Instant};
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::{
    bootstrap::{Bootstrapped, StageOptions, initialize},
    context::Context,
    host::{DisplaySurface, FramePulse, HostEnvironment},
};

/// Host environment backed by a winit window.
pub(crate) struct WinitHost {
    window: Arc<Window>,
    resize_listener: Option<Box<dyn FnMut(u32, u32)>>,
    frame_callback: Option<Box<dyn FnMut(Duration) -> FramePulse>>,
}

impl WinitHost {
    fn new(window: Arc<Window>) -> Self {
        Self {
            window,
            resize_listener: None,
            frame_callback: None,
        }
    }

    fn emit_resize(&mut self, width: u32, height: u32) {
        if let Some(listener) = self.resize_listener.as_mut() {
            listener(width, height);
        }
    }

    /// Invoke the frame callback; `false` once the loop is stopped.
    fn emit_frame(&mut self, dt: Duration) -> bool {
        match self.frame_callback.as_mut() {
            Some(callback) => match callback(dt) {
                FramePulse::Continue => true,
                FramePulse::Stop => {
                    self.frame_callback = None;
                    false
                }
            },
            None => false,
        }
    }
}

/// The window is the display surface: winit already placed its canvas in
/// the container on the web, and owns the native window outright.
pub(crate) struct WindowSurface {
    window: Arc<Window>,
}

impl DisplaySurface for WindowSurface {
    fn dimensions(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    fn attach_output(&mut self, width: u32, height: u32) {
        log::debug!("renderer output attached at {width}x{height}");
    }
}

impl HostEnvironment for WinitHost {
    type Surface = WindowSurface;

    fn find_surface(&mut self, _id: &str) -> Option<WindowSurface> {
        Some(WindowSurface {
            window: self.window.clone(),
        })
    }

    fn set_resize_listener(&mut self, listener: Box<dyn FnMut(u32, u32)>) {
        self.resize_listener = Some(listener);
    }

    fn schedule_frames(&mut self, callback: Box<dyn FnMut(Duration) -> FramePulse>) {
        self.frame_callback = Some(callback);
    }
}

pub(crate) enum StageEvent {
    #[allow(dead_code)]
    Initialized {
        host: WinitHost,
        boot: Bootstrapped<Context>,
    },
}

pub struct App {
    #[cfg(not(target_arch = "wasm32"))]
    async_runtime: tokio::runtime::Runtime,
    #[allow(dead_code)]
    proxy: winit::event_loop::EventLoopProxy<StageEvent>,
    options: Option<StageOptions>,
    host: Option<WinitHost>,
    boot: Option<Bootstrapped<Context>>,
    last_time: Instant,
}

impl App {
    fn new(event_loop: &EventLoop<StageEvent>, options: StageOptions) -> Self {
        let proxy = event_loop.create_proxy();
        #[cfg(not(target_arch = "wasm32"))]
        let async_runtime = tokio::runtime::Runtime::new().expect("failed to start async runtime");
        Self {
            #[cfg(not(target_arch = "wasm32"))]
            async_runtime,
            proxy,
            options: Some(options),
            host: None,
            boot: None,
            last_time: Instant::now(),
        }
    }
}

impl ApplicationHandler<StageEvent> for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        // Resumed fires again on some platforms; the stage is built once.
        let options = match self.options.take() {
            Some(options) => options,
            None => return,
        };

        #[allow(unused_mut)]
        let mut window_attributes = Window::default_attributes();

        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            use winit::platform::web::WindowAttributesExtWebSys;

            let document = web_sys::window().and_then(|window| window.document());
            let Some(document) = document else {
                log::error!("no document to attach to");
                return;
            };
            let Some(container) = document.get_element_by_id(&options.container_id) else {
                log::error!("display surface '{}' not found", options.container_id);
                return;
            };
            let canvas = document
                .create_element("canvas")
                .unwrap_throw()
                .unchecked_into::<web_sys::HtmlCanvasElement>();
            container.append_child(&canvas).unwrap_throw();
            window_attributes = window_attributes.with_canvas(Some(canvas));
        }

        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .expect("failed to create the stage window"),
        );
        let mut host = WinitHost::new(window.clone());

        #[cfg(not(target_arch = "wasm32"))]
        {
            let result = self.async_runtime.block_on(initialize(
                &mut host,
                &options,
                |width, height| {
                    let window = window.clone();
                    async move { Context::new(window, width, height).await }
                },
            ));
            match result {
                Ok(boot) => {
                    self.host = Some(host);
                    self.boot = Some(boot);
                    window.request_redraw();
                }
                Err(error) => {
                    log::error!("stage initialization failed: {error}");
                    event_loop.exit();
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let proxy = self.proxy.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let mut host = host;
                let result = initialize(&mut host, &options, |width, height| {
                    let window = window.clone();
                    async move { Context::new(window, width, height).await }
                })
                .await;
                match result {
                    Ok(boot) => {
                        assert!(proxy.send_event(StageEvent::Initialized { host, boot }).is_ok());
                    }
                    Err(error) => log::error!("stage initialization failed: {error}"),
                }
            });
        }
    }

    fn user_event(&mut self, _event_loop: &ActiveEventLoop, event: StageEvent) {
        match event {
            StageEvent::Initialized { mut host, boot } => {
                // This is the message from our wasm `spawn_local`.
                // Trigger a resize and redraw now that we are initialized.
                let size = host.window.inner_size();
                host.emit_resize(size.width, size.height);
                host.window.request_redraw();
                self.host = Some(host);
                self.boot = Some(boot);
            }
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: DeviceId,
        event: DeviceEvent,
    ) {
        let boot = match &self.boot {
            Some(boot) => boot,
            None => return,
        };
        if let DeviceEvent::MouseMotion { delta: (dx, dy) } = event {
            boot.stage.borrow_mut().controls.handle_mouse(dx, dy);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (host, boot) = match (self.host.as_mut(), self.boot.as_ref()) {
            (Some(host), Some(boot)) => (host, boot),
            _ => return,
        };

        boot.stage.borrow_mut().controls.handle_window_events(&event);

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => host.emit_resize(size.width, size.height),
            WindowEvent::RedrawRequested => {
                let dt = self.last_time.elapsed();
                self.last_time = Instant::now();
                if host.emit_frame(dt) {
                    host.window.request_redraw();
                } else {
                    // The render loop was cancelled; nothing left to drive.
                    event_loop.exit();
                }
            }
            _ => {}
        }
    }
}

/// Build the event loop and run a stage with `options` until the host
/// tears it down.
pub fn run(options: StageOptions) -> anyhow::Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        if let Err(e) = env_logger::try_init() {
            println!("Warning: Could not initialize logger: {}", e);
        };
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_log::init_with_level(log::Level::Info).unwrap_throw();
    }

    let event_loop: EventLoop<StageEvent> = EventLoop::with_user_event().build()?;
    let mut app = App::new(&event_loop, options);

    event_loop.run_app(&mut app)?;

    Ok(())
}
