use std::thread;
use std::sync::mpsc;
use std::sync::{ Arc, Mutex };

use log::{ info, debug, error };

use crate::world::Renderer;
use crate::camera::Camera;
use crate::canvas::Canvas;
use crate::error::SceneError;

pub enum Message {
    Row(usize),
    Terminate,
}

struct Worker {
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: usize, renderer: Arc<dyn Renderer>, camera: Arc<Camera>,
        canvas: Arc<Mutex<Canvas>>, depth: usize,
        receiver: Arc<Mutex<mpsc::Receiver<Message>>>) -> Worker {

        let thread = thread::spawn(move || loop {
            // The receiver lock is released as soon as a message arrives.
            let message = match receiver.lock() {
                Ok(rx) => rx.recv(),
                Err(_) => break,
            };

            match message {
                Ok(Message::Row(y)) => {
                    let row: Vec<_> = (0..camera.hsize)
                        .map(|x| renderer.color_at(camera.ray_for_pixel(x, y), depth))
                        .collect();

                    match canvas.lock() {
                        Ok(mut c) => c.write_row(y, &row),
                        Err(_) => {
                            error!("Worker {} found the canvas poisoned", id);
                            break;
                        },
                    }

                    debug!("Worker {} finished row {}", id, y);
                },

                // Exit the worker thread loop, terminating the thread.
                Ok(Message::Terminate) | Err(_) => break,
            }
        });

        Worker { thread: Some(thread) }
    }
}

/// A fixed set of threads rendering whole rows of a canvas.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool {
    pub fn new(size: usize, renderer: Arc<dyn Renderer>, camera: Arc<Camera>,
        canvas: Arc<Mutex<Canvas>>, depth: usize) -> ThreadPool {
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        // There should be at least one thread to run workers.
        let workers = (0..size.max(1)).map(|id| Worker::new(
            id,
            Arc::clone(&renderer),
            Arc::clone(&camera),
            Arc::clone(&canvas),
            depth,
            Arc::clone(&receiver)
        )).collect();

        ThreadPool { workers, sender }
    }

    pub fn execute(&self, message: Message) -> Result<(), SceneError> {
        self.sender.send(message)
            .map_err(|_| SceneError::Render("all workers have stopped".to_string()))
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        for _ in &self.workers {
            // A worker which already stopped does not need telling.
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if thread.join().is_err() {
                    error!("A render worker panicked");
                }
            }
        }
    }
}

/// Renders a canvas with `threads` workers, one row at a time.
pub fn parallel_render<R: Renderer + 'static>(renderer: R, camera: Camera,
    threads: usize, depth: usize) -> Result<Canvas, SceneError> {
    let canvas = Arc::new(Mutex::new(Canvas::new(camera.hsize, camera.vsize)));
    let vsize = camera.vsize;

    info!("Rendering {}x{} using {} threads...", camera.hsize, vsize, threads);
    {
        let renderer: Arc<dyn Renderer> = Arc::new(renderer);
        let thread_pool = ThreadPool::new(
            threads, renderer, Arc::new(camera), Arc::clone(&canvas), depth
        );

        for y in 0..vsize {
            thread_pool.execute(Message::Row(y))?;
        }
    }
    info!("...done.");

    let image = canvas.lock()
        .map(|c| c.clone())
        .map_err(|_| SceneError::Render("canvas poisoned".to_string()))?;

    Ok(image)
}

#[test]
fn parallel_render_matches_serial_render() {
    use crate::color::Color;
    use crate::matrix::Matrix4D;
    use crate::shape::Shape;
    use crate::tuple::Tuple4D;
    use crate::world::World;

    let scene = || {
        let mut w = World::with_background(Color::blue());
        w.add_matte(Shape::sphere(), Color::green());
        w
    };
    let camera = Camera::new(9, 7, std::f64::consts::PI / 2.0,
        Matrix4D::view_transform(
            Tuple4D::point(0.0, 0.0, -5.0),
            Tuple4D::point(0.0, 0.0, 0.0),
            Tuple4D::vector(0.0, 1.0, 0.0)
        )).unwrap();

    let serial = camera.render(&scene(), 3);
    let parallel = parallel_render(scene(), camera, 3, 3).unwrap();

    assert_eq!(serial, parallel);
}
