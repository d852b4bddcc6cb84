use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Float32Array, Object, Reflect};
use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
    HtmlCanvasElement, MouseEvent, WebGl2RenderingContext as GL, WebGlBuffer, WebGlProgram,
    WebGlShader, WebGlUniformLocation, WebGlVertexArrayObject,
};

use super::dom;
use crate::config::GradientConfig;
use crate::error::{EffectError, EffectResult};
use crate::gradient::{shader, GradientState, StarField};

fn compile(gl: &GL, kind: u32, source: &str) -> EffectResult<WebGlShader> {
    let shader = gl
        .create_shader(kind)
        .ok_or_else(|| EffectError::gl("create_shader failed"))?;
    gl.shader_source(&shader, source);
    gl.compile_shader(&shader);
    let ok = gl
        .get_shader_parameter(&shader, GL::COMPILE_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(shader)
    } else {
        let log = gl.get_shader_info_log(&shader).unwrap_or_default();
        gl.delete_shader(Some(&shader));
        Err(EffectError::gl(format!("shader compile: {log}")))
    }
}

fn link(gl: &GL, vertex: &str, fragment: &str) -> EffectResult<WebGlProgram> {
    let vs = compile(gl, GL::VERTEX_SHADER, vertex)?;
    let fs = compile(gl, GL::FRAGMENT_SHADER, fragment)?;
    let program = gl
        .create_program()
        .ok_or_else(|| EffectError::gl("create_program failed"))?;
    gl.attach_shader(&program, &vs);
    gl.attach_shader(&program, &fs);
    gl.link_program(&program);
    gl.delete_shader(Some(&vs));
    gl.delete_shader(Some(&fs));
    let ok = gl
        .get_program_parameter(&program, GL::LINK_STATUS)
        .as_bool()
        .unwrap_or(false);
    if ok {
        Ok(program)
    } else {
        Err(EffectError::gl(format!(
            "program link: {}",
            gl.get_program_info_log(&program).unwrap_or_default()
        )))
    }
}

/// Enable a float attribute if the linker kept it.
fn attribute(gl: &GL, program: &WebGlProgram, name: &str, size: i32, stride: i32, offset: i32) {
    let loc = gl.get_attrib_location(program, name);
    if loc < 0 {
        debug!("attribute {name} optimised out");
        return;
    }
    gl.enable_vertex_attrib_array(loc as u32);
    gl.vertex_attrib_pointer_with_i32(loc as u32, size, GL::FLOAT, false, stride, offset);
}

struct Uniforms {
    time: Option<WebGlUniformLocation>,
    resolution: Option<WebGlUniformLocation>,
    mouse: Option<WebGlUniformLocation>,
    colors: Option<WebGlUniformLocation>,
    noise_offset: Option<WebGlUniformLocation>,
    seed: Option<WebGlUniformLocation>,
}

impl Uniforms {
    fn locate(gl: &GL, program: &WebGlProgram) -> Self {
        Self {
            time: gl.get_uniform_location(program, "u_time"),
            resolution: gl.get_uniform_location(program, "u_resolution"),
            mouse: gl.get_uniform_location(program, "u_mouse"),
            colors: gl.get_uniform_location(program, "u_colors"),
            noise_offset: gl.get_uniform_location(program, "u_noiseOffset"),
            seed: gl.get_uniform_location(program, "u_seed"),
        }
    }

    fn upload(&self, gl: &GL, state: &GradientState) {
        gl.uniform1f(self.time.as_ref(), state.time as f32);
        gl.uniform2f(
            self.resolution.as_ref(),
            state.resolution.x,
            state.resolution.y,
        );
        gl.uniform2f(self.mouse.as_ref(), state.pointer.x, state.pointer.y);
        gl.uniform3fv_with_f32_array(self.colors.as_ref(), &state.palette().to_uniform());
        gl.uniform2f(
            self.noise_offset.as_ref(),
            state.noise_offset.x,
            state.noise_offset.y,
        );
        gl.uniform1f(self.seed.as_ref(), state.seed);
    }
}

struct Scene {
    canvas: HtmlCanvasElement,
    gl: GL,
    gradient: WebGlProgram,
    uniforms: Uniforms,
    quad: WebGlVertexArrayObject,
    star_program: WebGlProgram,
    star_vao: WebGlVertexArrayObject,
    star_buffer: WebGlBuffer,
    star_vertices: Vec<f32>,
    stars: StarField,
    state: GradientState,
}

impl Scene {
    fn new(canvas: HtmlCanvasElement, config: &GradientConfig) -> EffectResult<Self> {
        let options = Object::new();
        Reflect::set(&options, &"preserveDrawingBuffer".into(), &JsValue::TRUE)?;
        Reflect::set(&options, &"alpha".into(), &JsValue::TRUE)?;
        let gl: GL = canvas
            .get_context_with_context_options("webgl2", &options)?
            .ok_or_else(|| EffectError::gl("WebGL2 not supported"))?
            .dyn_into::<GL>()
            .map_err(|_| EffectError::gl("webgl2 context has the wrong type"))?;

        let gradient = link(&gl, shader::QUAD_VERTEX, shader::GRADIENT_FRAGMENT)?;
        let uniforms = Uniforms::locate(&gl, &gradient);
        let quad = gl
            .create_vertex_array()
            .ok_or_else(|| EffectError::gl("create_vertex_array failed"))?;
        gl.bind_vertex_array(Some(&quad));
        let quad_buffer = gl
            .create_buffer()
            .ok_or_else(|| EffectError::gl("create_buffer failed"))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&quad_buffer));
        gl.buffer_data_with_array_buffer_view(
            GL::ARRAY_BUFFER,
            &Float32Array::from(&shader::QUAD[..]),
            GL::STATIC_DRAW,
        );
        attribute(&gl, &gradient, "a_position", 2, 0, 0);

        let star_program = link(&gl, shader::STAR_VERTEX, shader::STAR_FRAGMENT)?;
        let star_vao = gl
            .create_vertex_array()
            .ok_or_else(|| EffectError::gl("create_vertex_array failed"))?;
        gl.bind_vertex_array(Some(&star_vao));
        let star_buffer = gl
            .create_buffer()
            .ok_or_else(|| EffectError::gl("create_buffer failed"))?;
        gl.bind_buffer(GL::ARRAY_BUFFER, Some(&star_buffer));
        // x, y, z, size, alpha
        attribute(&gl, &star_program, "a_position", 3, 20, 0);
        attribute(&gl, &star_program, "a_size", 1, 20, 12);
        attribute(&gl, &star_program, "a_alpha", 1, 20, 16);
        gl.bind_vertex_array(None);
        gl.clear_color(0.0, 0.0, 0.0, 0.0);

        let random = || js_sys::Math::random() as f32;
        let (w, h) = dom::viewport(&dom::window()?)?;
        let state = GradientState::new(config, random(), w as f32, h as f32)?;
        let stars = StarField::generate(config.star_count, config.max_star_size, random);

        let mut scene = Self {
            canvas,
            gl,
            gradient,
            uniforms,
            quad,
            star_program,
            star_vao,
            star_buffer,
            star_vertices: Vec::new(),
            stars,
            state,
        };
        scene.resize(w, h);
        Ok(scene)
    }

    fn resize(&mut self, width: f64, height: f64) {
        self.state.resize(width as f32, height as f32);
        self.canvas.set_width(width as u32);
        self.canvas.set_height(height as u32);
        self.gl.viewport(0, 0, width as i32, height as i32);
    }

    fn frame(&mut self) {
        self.state.tick();
        let gl = &self.gl;
        gl.clear(GL::COLOR_BUFFER_BIT);

        gl.use_program(Some(&self.gradient));
        self.uniforms.upload(gl, &self.state);
        gl.bind_vertex_array(Some(&self.quad));
        gl.draw_arrays(GL::TRIANGLES, 0, 6);

        if !self.stars.is_empty() {
            self.stars.write_vertices(
                self.state.time,
                self.state.resolution.y,
                &mut self.star_vertices,
            );
            gl.enable(GL::BLEND);
            gl.blend_func(GL::SRC_ALPHA, GL::ONE_MINUS_SRC_ALPHA);
            gl.use_program(Some(&self.star_program));
            gl.bind_vertex_array(Some(&self.star_vao));
            gl.bind_buffer(GL::ARRAY_BUFFER, Some(&self.star_buffer));
            gl.buffer_data_with_array_buffer_view(
                GL::ARRAY_BUFFER,
                &Float32Array::from(&self.star_vertices[..]),
                GL::DYNAMIC_DRAW,
            );
            gl.draw_arrays(GL::POINTS, 0, self.stars.len() as i32);
            gl.disable(GL::BLEND);
        }
        gl.bind_vertex_array(None);
    }
}

/// Full-viewport animated noise gradient on `#gradient`.
#[wasm_bindgen]
pub struct GradientRenderer {
    scene: Rc<RefCell<Scene>>,
    on_resize: Closure<dyn FnMut()>,
    on_pointer: Closure<dyn FnMut(MouseEvent)>,
}

#[wasm_bindgen]
impl GradientRenderer {
    /// Start the background. Returns `undefined` when the mount points are missing.
    pub fn init(config_json: Option<String>) -> Result<Option<GradientRenderer>, JsValue> {
        let config = match config_json {
            Some(raw) => GradientConfig::from_json(&raw)?,
            None => GradientConfig::default(),
        };
        let document = dom::document()?;
        if document.get_element_by_id(&config.container_id).is_none() {
            debug!("#{} missing, gradient disabled", config.container_id);
            return Ok(None);
        }
        let Some(canvas) = document
            .get_element_by_id(&config.canvas_id)
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            debug!("#{} missing, gradient disabled", config.canvas_id);
            return Ok(None);
        };

        let scene = Rc::new(RefCell::new(Scene::new(canvas, &config)?));
        let window = dom::window()?;

        // Resize canvas to fit window
        let on_resize = {
            let scene = scene.clone();
            Closure::wrap(Box::new(move || match web_sys::window().map(|w| dom::viewport(&w)) {
                Some(Ok((w, h))) => scene.borrow_mut().resize(w, h),
                _ => warn!("viewport unavailable during resize"),
            }) as Box<dyn FnMut()>)
        };
        window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

        let on_pointer = {
            let scene = scene.clone();
            Closure::wrap(Box::new(move |event: MouseEvent| {
                scene
                    .borrow_mut()
                    .state
                    .pointer_move(event.client_x() as f32, event.client_y() as f32);
            }) as Box<dyn FnMut(MouseEvent)>)
        };
        window
            .add_event_listener_with_callback("mousemove", on_pointer.as_ref().unchecked_ref())?;

        // Animation loop
        // `f` holds the animation-frame closure so that we can keep calling
        // `request_animation_frame` recursively.
        let f: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
        let g = f.clone();
        let frame_scene = scene.clone();
        *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            frame_scene.borrow_mut().frame();

            // schedule next
            let next = f.borrow();
            if let (Some(window), Some(cb)) = (web_sys::window(), next.as_ref()) {
                if let Err(err) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    warn!("requestAnimationFrame failed: {err:?}");
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = g.borrow().as_ref() {
            window.request_animation_frame(cb.as_ref().unchecked_ref())?;
        }

        {
            let s = scene.borrow();
            info!(
                "gradient running at {}x{}, seed {:.4}",
                s.state.resolution.x, s.state.resolution.y, s.state.seed
            );
        }

        Ok(Some(GradientRenderer {
            scene,
            on_resize,
            on_pointer,
        }))
    }

    /// Advance to the next palette; returns its index.
    #[wasm_bindgen(js_name = cyclePalette)]
    pub fn cycle_palette(&self) -> usize {
        self.scene.borrow_mut().state.cycle_palette()
    }

    /// Re-read the viewport size. Safe to call at any time.
    pub fn resize(&self) -> Result<(), JsValue> {
        let (w, h) = dom::viewport(&dom::window()?)?;
        self.scene.borrow_mut().resize(w, h);
        Ok(())
    }

    /// Current `u_resolution` as `[width, height]`.
    pub fn resolution(&self) -> Vec<f32> {
        self.scene.borrow().state.resolution.to_array().to_vec()
    }

    pub fn time(&self) -> f64 {
        self.scene.borrow().state.time
    }

    /// Detach the resize and pointer listeners.
    pub fn cleanup(&self) -> Result<(), JsValue> {
        Ok(self.detach()?)
    }
}

impl GradientRenderer {
    fn detach(&self) -> EffectResult<()> {
        let window = dom::window()?;
        window.remove_event_listener_with_callback(
            "resize",
            self.on_resize.as_ref().unchecked_ref(),
        )?;
        window.remove_event_listener_with_callback(
            "mousemove",
            self.on_pointer.as_ref().unchecked_ref(),
        )?;
        Ok(())
    }
}

// `free()` from JS drops the closures; they must not stay registered.
impl Drop for GradientRenderer {
    fn drop(&mut self) {
        if let Err(err) = self.detach() {
            warn!("could not detach gradient listeners: {err}");
        }
    }
}
