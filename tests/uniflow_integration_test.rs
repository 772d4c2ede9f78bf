#[cfg(feature = "integration-tests")]
use kleczewsky_world::flow::ImageTestResult;
use kleczewsky_world::{
    context::Context,
    flow::{FlowConsturctor, GraphicsFlow, Out},
    render::Render,
};
use wgpu::Color;

use crate::common::test_utils::State;

mod common;

enum Event {
    Test,
}

struct GraphicsElement;

impl GraphicsFlow<State, Event> for GraphicsElement {
    fn on_init(&mut self, ctx: &mut Context, state: &mut State) -> Out<State, Event> {
        ctx.clear_colour = Color::TRANSPARENT;
        assert_eq!(state.frame_counter(), 0);
        assert_eq!(state.init_invocations(), 0);
        assert_eq!(state.click_invocations(), 0);
        assert_eq!(state.update_invocations(), 0);

        state.init();
        Out::Empty
    }

    fn on_click(&mut self, _: &Context, state: &mut State) -> Out<State, Event> {
        state.click();
        Out::Empty
    }

    fn on_update(
        &mut self,
        _: &Context,
        state: &mut State,
        _: std::time::Duration,
    ) -> Out<State, Event> {
        assert_eq!(state.frame_counter(), state.update_invocations());
        assert_eq!(state.init_invocations(), 1);
        state.frame();
        state.update();

        let serve_sencha: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.dummy_state.push('🍵');
        });
        let serve_mate: Box<dyn FnOnce(&mut State)> = Box::new(|state: &mut State| {
            state.dummy_state.push('🧉');
        });
        match state.frame_counter() {
            3 => Out::FutEvent(vec![Box::new(async move { Event::Test })]),
            5 => Out::FutFn(vec![
                Box::new(async move { serve_sencha }),
                Box::new(async move { serve_mate }),
            ]),
            6 => Out::Configure(Box::new(|ctx: &mut Context| {
                ctx.clear_colour = Color::BLACK;
            })),
            x if x > 6 => {
                assert!(state.dummy_state.contains('🧉'));
                assert!(state.dummy_state.contains('🍵'));
                // emojis are 4 bytes wide.
                assert_eq!(state.dummy_state.len(), 8, "{}", state.dummy_state);
                Out::Empty
            }
            _ => Out::Empty,
        }
    }

    fn on_tick(&mut self, _: &Context, _: &mut State) -> Out<State, Event> {
        Out::Empty
    }

    fn on_device_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &kleczewsky_world::DeviceEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_window_events(
        &mut self,
        _: &Context,
        _: &mut State,
        _: &kleczewsky_world::WindowEvent,
    ) -> Out<State, Event> {
        Out::Empty
    }

    fn on_custom_events(&mut self, _: &Context, state: &mut State, _: Event) -> Option<Event> {
        // the event is sent in frame 3
        assert!(state.frame_counter() >= 3);
        assert!(state.update_invocations() >= 3);
        None
    }

    fn on_render(&self) -> Render<'_> {
        Render::None
    }

    #[cfg(feature = "integration-tests")]
    fn render_to_texture(
        &self,
        ctx: &Context,
        state: &mut State,
        _: &mut image::ImageBuffer<image::Rgba<u8>, wgpu::BufferView>,
    ) -> std::result::Result<ImageTestResult, anyhow::Error> {
        if state.frame_counter() > 7 {
            assert_eq!(ctx.clear_colour, Color::BLACK);
            Ok(ImageTestResult::Passed)
        } else {
            Ok(ImageTestResult::Waiting)
        }
    }
}

#[test]
#[cfg(feature = "integration-tests")]
fn should_deliver_events_and_state_mutations() {
    let model_constructor: FlowConsturctor<State, Event> = Box::new(|_| {
        Box::pin(async move { Box::new(GraphicsElement) as Box<dyn GraphicsFlow<_, _>> })
    });

    if let Err(e) = kleczewsky_world::flow::run(vec![model_constructor]) {
        panic!("{}", e);
    }
}
