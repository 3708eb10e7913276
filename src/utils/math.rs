use std::cmp::Ordering;

#[inline]
fn median_of_three_index(data: &[f64], low: usize, mid: usize, high: usize) -> usize {
    let a = data[low];
    let b = data[mid];
    let c = data[high];
    if (a <= b && b <= c) || (c <= b && b <= a) {
        mid
    } else if (b <= a && a <= c) || (c <= a && a <= b) {
        low
    } else {
        high
    }
}

/// Partition data in-place using Lomuto scheme
fn partition_inplace(data: &mut [f64], low: usize, high: usize) -> usize {
    if low >= high {
        return low;
    }
    let mid = low + (high - low) / 2;
    let pivot_index = median_of_three_index(data, low, mid, high);

    data.swap(pivot_index, high);
    let pivot_value = data[high];

    let mut i = low;
    for j in low..high {
        if data[j] <= pivot_value {
            data.swap(i, j);
            i += 1;
        }
    }
    data.swap(i, high);
    i
}

// Iterative quickselect with median-of-three pivots
fn select_inplace(data: &mut [f64], k: usize) -> Option<f64> {
    if data.is_empty() || k >= data.len() {
        return None;
    }

    let mut low = 0;
    let mut high = data.len() - 1;

    loop {
        if low == high {
            return if low == k { Some(data[low]) } else { None };
        }
        let pivot_index = partition_inplace(data, low, high);
        match pivot_index.cmp(&k) {
            Ordering::Equal => return Some(data[k]),
            Ordering::Greater => {
                if pivot_index == 0 {
                    return None;
                }
                high = pivot_index - 1;
            }
            Ordering::Less => {
                low = pivot_index + 1;
            }
        }
        if low > high {
            return None;
        }
    }
}

/// Median of the finite values in `data`; `None` when there are none.
pub fn median(data: &[f64]) -> Option<f64> {
    let mut data_copy: Vec<f64> = data.iter().copied().filter(|x| x.is_finite()).collect();
    let size = data_copy.len();
    if size == 0 {
        return None;
    }
    match size {
        even if even % 2 == 0 => {
            let k1 = (even / 2) - 1;
            let k2 = even / 2;
            let fst = select_inplace(&mut data_copy, k1)?;
            let snd = data_copy[k2..].iter().copied().reduce(f64::min)?;
            Some((fst + snd) / 2.0)
        }
        odd => select_inplace(&mut data_copy, odd / 2),
    }
}

pub fn mean(data: &[f64]) -> Option<f64> {
    if data.is_empty() {
        return None;
    }
    Some(data.iter().sum::<f64>() / data.len() as f64)
}
