//! Bottom-up expression tree evaluation (C5): each node is a pure function
//! of its already-evaluated children. Distinct frames within a segment
//! fan out across a bounded worker pool (same `crossbeam` shape as
//! `igni-decode::pool`) but are written back in strict output order, per
//! the distilled spec's muxer-ordering requirement.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use igni_decode::{FrameMap, RasterFrame};
use igni_expr::{Data, FrameExpr, Rational, SourceIndex, SourceLookup};

use crate::draw;
use crate::error::RenderError;
use crate::scale;

enum NodeValue {
    Frame(RasterFrame),
    Data(Data),
}

impl NodeValue {
    fn into_frame(self, filter: &str) -> Result<RasterFrame, RenderError> {
        match self {
            NodeValue::Frame(f) => Ok(f),
            NodeValue::Data(_) => Err(RenderError::new(filter, None, "expected a frame argument, got data")),
        }
    }

    fn into_data(self, filter: &str) -> Result<Data, RenderError> {
        match self {
            NodeValue::Data(d) => Ok(d),
            NodeValue::Frame(_) => Err(RenderError::new(filter, None, "expected a data argument, got a frame")),
        }
    }
}

/// Evaluates one root expression to a single output frame.
pub fn eval_root(root: &FrameExpr, frame_map: &FrameMap, lookup: &dyn SourceLookup) -> Result<RasterFrame, RenderError> {
    let value = eval_node(root, frame_map, lookup)?;
    value.into_frame("<root>")
}

fn eval_node(expr: &FrameExpr, frame_map: &FrameMap, lookup: &dyn SourceLookup) -> Result<NodeValue, RenderError> {
    match expr {
        FrameExpr::Data { value } => Ok(NodeValue::Data(value.clone())),
        FrameExpr::Source { video, index } => {
            let pts = match index {
                SourceIndex::IT { t } => *t,
                SourceIndex::ILoc { index } => lookup
                    .pts_at(video, *index)
                    .ok_or_else(|| RenderError::new("<source>", None, format!("ILoc {index} out of range for {video}")))?,
            };
            let frame = frame_map
                .get(&(video.clone(), pts))
                .ok_or_else(|| RenderError::new("<source>", Some(pts), format!("no decoded frame for {video} at {pts}")))?;
            Ok(NodeValue::Frame((**frame).clone()))
        }
        FrameExpr::Filter { name, args, kwargs } => eval_filter(name, args, kwargs, frame_map, lookup),
    }
}

fn eval_filter(
    name: &str,
    args: &[FrameExpr],
    kwargs: &[(String, FrameExpr)],
    frame_map: &FrameMap,
    lookup: &dyn SourceLookup,
) -> Result<NodeValue, RenderError> {
    let mut frame_args = Vec::with_capacity(args.len());
    for arg in args {
        frame_args.push(eval_node(arg, frame_map, lookup)?.into_frame(name)?);
    }

    let mut data_kwargs = HashMap::with_capacity(kwargs.len());
    for (key, value_expr) in kwargs {
        let value = eval_node(value_expr, frame_map, lookup)?.into_data(name)?;
        data_kwargs.insert(key.clone(), value);
    }

    let frame = dispatch(name, &frame_args, &data_kwargs)?;
    Ok(NodeValue::Frame(frame))
}

fn dispatch(name: &str, args: &[RasterFrame], kwargs: &HashMap<String, Data>) -> Result<RasterFrame, RenderError> {
    match name {
        "Scale" => {
            let width = kwargs
                .get("width")
                .and_then(Data::as_int)
                .ok_or_else(|| RenderError::new("Scale", None, "missing width"))? as u32;
            let height = kwargs
                .get("height")
                .and_then(Data::as_int)
                .ok_or_else(|| RenderError::new("Scale", None, "missing height"))? as u32;
            let pix_fmt_name = kwargs
                .get("pix_fmt")
                .and_then(Data::as_str)
                .ok_or_else(|| RenderError::new("Scale", None, "missing pix_fmt"))?;
            let pix_fmt = igni_decode::PixFmt::from_str_lossy(pix_fmt_name)
                .ok_or_else(|| RenderError::new("Scale", None, format!("unknown pix_fmt {pix_fmt_name:?}")))?;
            scale::scale(&args[0], width, height, pix_fmt)
        }
        "_black" => draw::black(kwargs),
        "_inline_mat" => draw::inline_mat(kwargs),
        "_slice_mat" => draw::slice_mat(&args[0], kwargs),
        "_slice_write_mat" => draw::slice_write_mat(&args[0], &args[1], kwargs),
        "cv2.rectangle" => draw::rectangle(&args[0], kwargs),
        "cv2.circle" => draw::circle(&args[0], kwargs),
        "cv2.line" => draw::line(&args[0], kwargs),
        "cv2.ellipse" => draw::ellipse(&args[0], kwargs),
        "cv2.arrowedLine" => draw::arrowed_line(&args[0], kwargs),
        "cv2.polylines" => draw::polylines(&args[0], kwargs),
        "cv2.fillPoly" => draw::fill_poly(&args[0], kwargs),
        "cv2.drawMarker" => draw::draw_marker(&args[0], kwargs),
        "cv2.drawContours" => draw::draw_contours(&args[0], kwargs),
        "cv2.putText" => draw::put_text(&args[0], kwargs),
        "cv2.addWeighted" => draw::add_weighted(&args[0], &args[1], kwargs),
        other => Err(RenderError::new(other, None, "unregistered filter reached the evaluator")),
    }
}

/// Evaluates every frame in a segment, fanning out across a bounded worker
/// pool but preserving the input order in the returned `Vec`.
pub fn eval_segment(
    roots: &[FrameExpr],
    frame_map: &FrameMap,
    lookup: &dyn (SourceLookup + Sync),
    max_workers: usize,
    cancelled: &AtomicBool,
) -> Result<Vec<RasterFrame>, RenderError> {
    if roots.is_empty() {
        return Ok(Vec::new());
    }
    let max_workers = max_workers.max(1).min(roots.len());
    let (sender, receiver) = crossbeam_channel::bounded::<(usize, &FrameExpr)>(roots.len());
    for (i, root) in roots.iter().enumerate() {
        sender.send((i, root)).expect("channel sized to root count");
    }
    drop(sender);

    let partials: Vec<Result<Vec<(usize, RasterFrame)>, RenderError>> = crossbeam_utils::thread::scope(|scope| {
        let handles: Vec<_> = (0..max_workers)
            .map(|_| {
                let rx = receiver.clone();
                scope.spawn(move |_| {
                    let mut out = Vec::new();
                    while let Ok((index, root)) = rx.recv() {
                        if cancelled.load(Ordering::Relaxed) {
                            return Err(RenderError::new("<segment>", None, "cancelled"));
                        }
                        let frame = eval_root(root, frame_map, lookup)?;
                        out.push((index, frame));
                    }
                    Ok(out)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().expect("filter worker panicked")).collect()
    })
    .expect("filter worker pool scope failed");

    let mut indexed = Vec::with_capacity(roots.len());
    for partial in partials {
        indexed.extend(partial?);
    }
    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, frame)| frame).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EmptyLookup;

    impl SourceLookup for EmptyLookup {
        fn pts_at(&self, _source: &igni_expr::SourceId, _index: i64) -> Option<Rational> {
            None
        }
    }

    fn black_root() -> FrameExpr {
        FrameExpr::filter(
            "_black",
            Vec::new(),
            vec![
                ("width".to_string(), FrameExpr::data(Data::Int(4))),
                ("height".to_string(), FrameExpr::data(Data::Int(4))),
                ("pix_fmt".to_string(), FrameExpr::data(Data::String("bgr24".to_string()))),
            ],
        )
    }

    /// S6: a pre-set cancellation flag aborts `eval_segment` before any
    /// frame evaluates, with no subprocess or decoded source involved.
    #[test]
    fn eval_segment_honors_a_pre_set_cancellation_flag() {
        let roots = vec![black_root(), black_root()];
        let frame_map = FrameMap::new();
        let lookup = EmptyLookup;
        let cancelled = AtomicBool::new(true);

        let err = eval_segment(&roots, &frame_map, &lookup, 1, &cancelled).unwrap_err();
        assert_eq!(err.to_string(), RenderError::new("<segment>", None, "cancelled").to_string());
    }

    #[test]
    fn eval_segment_runs_to_completion_when_not_cancelled() {
        let roots = vec![black_root(), black_root()];
        let frame_map = FrameMap::new();
        let lookup = EmptyLookup;
        let cancelled = AtomicBool::new(false);

        let frames = eval_segment(&roots, &frame_map, &lookup, 1, &cancelled).unwrap();
        assert_eq!(frames.len(), 2);
    }
}
